use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

/// Runtime type of a native node, used to pick its wrapper type.
#[derive(Clone, Copy)]
pub struct NodeKind {
	id: TypeId,
	name: &'static str,
}

impl NodeKind {
	pub fn of<T: Any>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl PartialEq for NodeKind {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for NodeKind {}

impl Hash for NodeKind {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "NodeKind({})", self.name)
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// Identity of a native node, stable for as long as the node is alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeKey(usize);

/// Shared handle to a node owned by the runtime backend.
///
/// The adapter layer never looks inside. Backends downcast back to their own node type,
/// which is expected to use interior mutability for anything the wrapper writes to.
#[derive(Clone)]
pub struct NativeNode {
	kind: NodeKind,
	object: Rc<dyn Any>,
}

impl NativeNode {
	pub fn new<T: Any>(object: T) -> Self {
		Self::from_rc(Rc::new(object))
	}

	pub fn from_rc<T: Any>(object: Rc<T>) -> Self {
		Self {
			kind: NodeKind::of::<T>(),
			object,
		}
	}

	pub fn kind(&self) -> NodeKind {
		self.kind
	}

	pub fn key(&self) -> NodeKey {
		NodeKey(Rc::as_ptr(&self.object) as *const () as usize)
	}

	pub fn ptr_eq(&self, other: &NativeNode) -> bool {
		self.key() == other.key()
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.object.downcast_ref::<T>()
	}

	pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
		Rc::clone(&self.object).downcast::<T>().ok()
	}

	pub fn downgrade(&self) -> WeakNativeNode {
		WeakNativeNode {
			kind: self.kind,
			object: Rc::downgrade(&self.object),
		}
	}
}

impl PartialEq for NativeNode {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl Eq for NativeNode {}

impl Hash for NativeNode {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.key().hash(state);
	}
}

impl fmt::Debug for NativeNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "NativeNode({}@{:#x})", self.kind.name, self.key().0)
	}
}

/// Non-owning handle, for backends that keep parent links on their nodes.
#[derive(Clone)]
pub struct WeakNativeNode {
	kind: NodeKind,
	object: Weak<dyn Any>,
}

impl WeakNativeNode {
	pub fn upgrade(&self) -> Option<NativeNode> {
		Some(NativeNode {
			kind: self.kind,
			object: self.object.upgrade()?,
		})
	}
}

impl fmt::Debug for WeakNativeNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "WeakNativeNode({})", self.kind.name)
	}
}
