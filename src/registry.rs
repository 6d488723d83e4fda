use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, warn};

use crate::error::{AdapterError, AdapterResult};
use crate::node::{NativeNode, NodeKey, NodeKind};
use crate::wrapper::{WrapperRef, WrapperType};

/// Registered wrapper type for one kind of native node.
#[derive(Clone, Copy)]
pub struct WrapperClass {
	pub name: &'static str,
	pub is_scene: bool,
	pub construct: fn(NativeNode) -> WrapperRef,
}

impl WrapperClass {
	pub fn of<W: WrapperType>() -> Self {
		Self {
			name: W::CLASS_NAME,
			is_scene: W::IS_SCENE,
			construct: construct::<W>,
		}
	}
}

impl fmt::Debug for WrapperClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WrapperClass")
			.field("name", &self.name)
			.field("is_scene", &self.is_scene)
			.finish()
	}
}

fn construct<W: WrapperType>(target: NativeNode) -> WrapperRef {
	Rc::new(RefCell::new(W::new(target)))
}

/// Maps native node kinds to wrapper types, and every live native node to its one wrapper.
///
/// Meant to be owned by the editor's main loop: it is not thread safe, and any other
/// access pattern needs its own synchronization around registration and lookups.
#[derive(Default)]
pub struct WrapperRegistry {
	classes: RefCell<HashMap<NodeKind, WrapperClass>>,
	bound: RefCell<HashMap<NodeKey, WrapperRef>>,
	current_scene: RefCell<Option<NativeNode>>,
}

impl WrapperRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Native nodes of type `N` will be wrapped by `W`.
	pub fn register<N: Any, W: WrapperType>(&self) -> AdapterResult<()> {
		self.register_kind(NodeKind::of::<N>(), WrapperClass::of::<W>())
	}

	/// Registrations are append only: a kind can't be given another wrapper type later.
	pub fn register_kind(&self, kind: NodeKind, class: WrapperClass) -> AdapterResult<()> {
		if class.name.is_empty() {
			error!("Wrapper type for {kind} must have a class name");
			return Err(AdapterError::InvalidWrapperType(kind));
		}

		let mut classes = self.classes.borrow_mut();
		if let Some(existing) = classes.get(&kind) {
			error!("{kind} is already wrapped by {}", existing.name);
			return Err(AdapterError::AlreadyRegistered(kind));
		}
		debug!("Registered {} for {kind}", class.name);
		classes.insert(kind, class);
		Ok(())
	}

	pub fn is_registered(&self, kind: NodeKind) -> bool {
		self.classes.borrow().contains_key(&kind)
	}

	pub fn wrapper_class(&self, node: &NativeNode) -> Option<WrapperClass> {
		self.classes.borrow().get(&node.kind()).copied()
	}

	/// Returns the wrapper bound to `node`, creating it on first use.
	///
	/// Repeated calls hand out the same wrapper.
	pub fn get_wrapper(&self, node: &NativeNode) -> AdapterResult<WrapperRef> {
		if let Some(wrapper) = self.bound.borrow().get(&node.key()) {
			return Ok(Rc::clone(wrapper));
		}

		let Some(class) = self.wrapper_class(node) else {
			error!("NodeWrapper not registered for {}", node.kind());
			return Err(AdapterError::NotRegistered(node.kind()));
		};
		let wrapper = (class.construct)(node.clone());
		self.bound.borrow_mut().insert(node.key(), Rc::clone(&wrapper));
		Ok(wrapper)
	}

	/// Wrapper of `node` if one was bound already. Never creates one.
	pub fn bound_wrapper(&self, node: &NativeNode) -> Option<WrapperRef> {
		self.bound.borrow().get(&node.key()).cloned()
	}

	pub fn bound_count(&self) -> usize {
		self.bound.borrow().len()
	}

	/// Forgets the wrapper of a node the backend is discarding.
	pub fn discard(&self, node: &NativeNode) -> Option<WrapperRef> {
		let mut current_scene = self.current_scene.borrow_mut();
		if current_scene.as_ref() == Some(node) {
			*current_scene = None;
		}
		self.bound.borrow_mut().remove(&node.key())
	}

	/// Rebuilds the node of a deserialized wrapper and binds the two together.
	///
	/// The wrapper's previous target, if it was bound to this wrapper, is released.
	/// A rebuilt current scene stays the current scene.
	pub fn after_deserialize(&self, wrapper: &WrapperRef) -> AdapterResult<NativeNode> {
		let (old_target, node) = {
			let mut borrowed = wrapper.try_borrow_mut().map_err(|_| {
				error!("Can't deserialize a wrapper that is in use");
				AdapterError::WrapperBusy
			})?;
			let old_target = borrowed.target().clone();
			(old_target, borrowed.on_after_deserialize()?)
		};

		let mut bound = self.bound.borrow_mut();
		if bound
			.get(&old_target.key())
			.is_some_and(|existing| Rc::ptr_eq(existing, wrapper))
		{
			bound.remove(&old_target.key());
		}
		if let Some(previous) = bound.insert(node.key(), Rc::clone(wrapper)) {
			if !Rc::ptr_eq(&previous, wrapper) {
				warn!("{node:?} was bound to another wrapper, replacing it");
			}
		}
		drop(bound);

		let mut current_scene = self.current_scene.borrow_mut();
		if current_scene.as_ref() == Some(&old_target) {
			*current_scene = Some(node.clone());
		}
		Ok(node)
	}

	/// Marks `node` as the root of the scene being edited. Its kind must be wrapped by a scene wrapper.
	pub fn set_current_scene(&self, node: &NativeNode) -> AdapterResult<()> {
		match self.wrapper_class(node) {
			Some(class) if class.is_scene => {
				*self.current_scene.borrow_mut() = Some(node.clone());
				Ok(())
			}
			Some(class) => {
				error!("{} is not a scene wrapper", class.name);
				Err(AdapterError::Disallowed("current scene must use a scene wrapper"))
			}
			None => {
				error!("NodeWrapper not registered for {}", node.kind());
				Err(AdapterError::NotRegistered(node.kind()))
			}
		}
	}

	pub fn current_scene_node(&self) -> Option<NativeNode> {
		self.current_scene.borrow().clone()
	}

	/// Wrapper of the current scene root.
	pub fn current_scene(&self) -> Option<WrapperRef> {
		let node = self.current_scene_node()?;
		self.get_wrapper(&node).ok()
	}
}
