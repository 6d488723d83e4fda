/*!
Grafting extra state and behaviour onto native nodes after they were created.

A [`MixinClass`] declares state initializers and named behaviours. Mixing it into a node
runs its initializers (base classes first) against a per node host of typed components,
then copies its behaviours onto the host, later classes shadowing earlier ones.
The node itself is never touched: its kind, and so its wrapper type, stay what they were.
*/

use std::any::{Any, TypeId};
use std::cell::{RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::{AdapterError, AdapterResult};
use crate::node::{NativeNode, NodeKey, WeakNativeNode};

/// Identity a class must carry to be mixed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassId {
	Name(String),
	Script(Uuid),
}

impl fmt::Display for ClassId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ClassId::Name(name) => f.write_str(name),
			ClassId::Script(uuid) => write!(f, "script {uuid}"),
		}
	}
}

/// Typed state a node gained through mixins, one value per type.
#[derive(Default)]
pub struct Components {
	values: HashMap<TypeId, Box<dyn Any>>,
}

impl Components {
	/// Replaces any previous component of the same type.
	pub fn insert<T: Any>(&mut self, value: T) {
		self.values.insert(TypeId::of::<T>(), Box::new(value));
	}

	pub fn get<T: Any>(&self) -> Option<&T> {
		self.values.get(&TypeId::of::<T>())?.downcast_ref()
	}

	pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
		self.values.get_mut(&TypeId::of::<T>())?.downcast_mut()
	}

	pub fn contains<T: Any>(&self) -> bool {
		self.values.contains_key(&TypeId::of::<T>())
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

type Initializer = Box<dyn Fn(&NativeNode, &mut Components)>;

/// A behaviour member, run against the node and its components.
pub type Behaviour = Rc<dyn Fn(&NativeNode, &mut Components) -> AdapterResult<()>>;

pub struct MixinClass {
	id: Option<ClassId>,
	base: Option<Rc<MixinClass>>,
	initializers: Vec<Initializer>,
	behaviours: Vec<(String, Behaviour)>,
}

impl MixinClass {
	fn with_id(id: Option<ClassId>) -> Self {
		Self {
			id,
			base: None,
			initializers: Vec::new(),
			behaviours: Vec::new(),
		}
	}

	pub fn named(name: impl Into<String>) -> Self {
		Self::with_id(Some(ClassId::Name(name.into())))
	}

	pub fn script(uuid: Uuid) -> Self {
		Self::with_id(Some(ClassId::Script(uuid)))
	}

	/// A class without identity. It can serve as a base but can't be mixed in by itself.
	pub fn anonymous() -> Self {
		Self::with_id(None)
	}

	pub fn extends(mut self, base: Rc<MixinClass>) -> Self {
		self.base = Some(base);
		self
	}

	pub fn with_state(mut self, init: impl Fn(&NativeNode, &mut Components) + 'static) -> Self {
		self.initializers.push(Box::new(init));
		self
	}

	pub fn with_behaviour(
		mut self,
		name: impl Into<String>,
		behaviour: impl Fn(&NativeNode, &mut Components) -> AdapterResult<()> + 'static,
	) -> Self {
		self.behaviours.push((name.into(), Rc::new(behaviour)));
		self
	}

	/// `None` unless the identity is a non empty name or a script uuid.
	pub fn id(&self) -> Option<&ClassId> {
		match &self.id {
			Some(ClassId::Name(name)) if name.is_empty() => None,
			id => id.as_ref(),
		}
	}

	pub fn base(&self) -> Option<&Rc<MixinClass>> {
		self.base.as_ref()
	}

	/// Inheritance chain, root base first and `self` last.
	fn lineage(&self) -> Vec<&MixinClass> {
		let mut chain = vec![self];
		let mut current = self;
		while let Some(base) = current.base.as_deref() {
			chain.push(base);
			current = base;
		}
		chain.reverse();
		chain
	}
}

impl fmt::Debug for MixinClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MixinClass")
			.field("id", &self.id)
			.field("base", &self.base.as_ref().map(|base| &base.id))
			.field("behaviours", &self.behaviours.iter().map(|(name, _)| name).collect::<Vec<_>>())
			.finish()
	}
}

struct Host {
	/// Held weakly so the node's allocation, and so its key, can't be reused while the host lives.
	node: WeakNativeNode,
	record: Vec<Rc<MixinClass>>,
	components: Rc<RefCell<Components>>,
	members: BTreeMap<String, Behaviour>,
}

impl Host {
	fn new(node: &NativeNode) -> Self {
		Self {
			node: node.downgrade(),
			record: Vec::new(),
			components: Rc::default(),
			members: BTreeMap::new(),
		}
	}

	fn is_alive(&self) -> bool {
		self.node.upgrade().is_some()
	}

	fn is_for(&self, node: &NativeNode) -> bool {
		self.node.upgrade().is_some_and(|live| live.ptr_eq(node))
	}
}

fn host_of<'a>(hosts: &'a HashMap<NodeKey, Host>, node: &NativeNode) -> Option<&'a Host> {
	hosts.get(&node.key()).filter(|host| host.is_for(node))
}

fn borrow_components<'a>(
	components: &'a RefCell<Components>,
	node: &NativeNode,
) -> AdapterResult<RefMut<'a, Components>> {
	components.try_borrow_mut().map_err(|_| {
		error!("Mixin components of {node:?} are already in use");
		AdapterError::ComponentsBusy
	})
}

/// Per node hosts for mixed in classes, keyed by node identity.
///
/// No borrow of the hosts is held while initializers or behaviours run, so those may call back
/// into the composer. Touching the components of the node they are running on is refused with
/// [`AdapterError::ComponentsBusy`].
#[derive(Default)]
pub struct MixinComposer {
	hosts: RefCell<HashMap<NodeKey, Host>>,
}

impl MixinComposer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Grafts `class` onto `node`. Without class identity nothing is changed.
	pub fn mixin(&self, node: &NativeNode, class: &Rc<MixinClass>) -> AdapterResult<()> {
		let Some(id) = class.id() else {
			error!("The class to mixin must have a class name or script uuid");
			return Err(AdapterError::MixinIdentityMissing);
		};

		let (components, dead) = {
			let mut hosts = self.hosts.borrow_mut();
			let mut dead = Vec::new();
			hosts.retain(|_, host| {
				if host.is_alive() {
					return true;
				}
				// dropped after the borrow is released
				dead.push(Rc::clone(&host.components));
				false
			});
			let host = hosts.entry(node.key()).or_insert_with(|| Host::new(node));
			(Rc::clone(&host.components), dead)
		};
		drop(dead);

		let lineage = class.lineage();
		{
			let mut components = borrow_components(&components, node)?;
			for ancestor in &lineage {
				for init in &ancestor.initializers {
					init(node, &mut *components);
				}
			}
		}

		let replaced: Vec<Behaviour> = {
			let mut hosts = self.hosts.borrow_mut();
			// an initializer may have discarded the node meanwhile
			let host = hosts.entry(node.key()).or_insert_with(|| Host {
				components: Rc::clone(&components),
				..Host::new(node)
			});
			let mut replaced = Vec::new();
			for ancestor in &lineage {
				for (name, behaviour) in &ancestor.behaviours {
					replaced.extend(host.members.insert(name.clone(), Rc::clone(behaviour)));
				}
			}
			host.record.push(Rc::clone(class));
			replaced
		};
		drop(replaced);

		debug!("Mixed {id} into {node:?}");
		Ok(())
	}

	/// Classes mixed into `node`, oldest first.
	pub fn mixin_record(&self, node: &NativeNode) -> Vec<Rc<MixinClass>> {
		host_of(&self.hosts.borrow(), node)
			.map(|host| host.record.clone())
			.unwrap_or_default()
	}

	pub fn has_mixin(&self, node: &NativeNode, id: &ClassId) -> bool {
		host_of(&self.hosts.borrow(), node)
			.is_some_and(|host| host.record.iter().any(|class| class.id() == Some(id)))
	}

	/// Names of the behaviour members `node` carries, sorted.
	pub fn members(&self, node: &NativeNode) -> Vec<String> {
		host_of(&self.hosts.borrow(), node)
			.map(|host| host.members.keys().cloned().collect())
			.unwrap_or_default()
	}

	fn components_of(&self, node: &NativeNode) -> Option<Rc<RefCell<Components>>> {
		host_of(&self.hosts.borrow(), node).map(|host| Rc::clone(&host.components))
	}

	/// A copy of the `T` component of `node`.
	pub fn component<T: Any + Clone>(&self, node: &NativeNode) -> Option<T> {
		let components = self.components_of(node)?;
		let Ok(components) = components.try_borrow() else {
			warn!("Mixin components of {node:?} are in use, can't read them");
			return None;
		};
		components.get::<T>().cloned()
	}

	/// Runs `f` on the `T` component of `node`.
	pub fn component_mut<T: Any, R>(&self, node: &NativeNode, f: impl FnOnce(&mut T) -> R) -> AdapterResult<R> {
		let missing = || {
			error!("{node:?} has no {} component", std::any::type_name::<T>());
			AdapterError::MissingComponent(std::any::type_name::<T>())
		};
		let components = self.components_of(node).ok_or_else(missing)?;
		let mut components = borrow_components(&components, node)?;
		let component = components.get_mut::<T>().ok_or_else(missing)?;
		Ok(f(component))
	}

	/// Runs the behaviour `member` on `node`.
	pub fn invoke(&self, node: &NativeNode, member: &str) -> AdapterResult<()> {
		let (behaviour, components) = {
			let hosts = self.hosts.borrow();
			let Some(behaviour) = host_of(&hosts, node).and_then(|host| {
				let behaviour = host.members.get(member)?;
				Some((Rc::clone(behaviour), Rc::clone(&host.components)))
			}) else {
				error!("{node:?} has no mixin member {member:?}");
				return Err(AdapterError::UnknownMember(member.to_owned()));
			};
			behaviour
		};
		let mut components = borrow_components(&components, node)?;
		behaviour(node, &mut *components)
	}

	/// Drops everything mixed into a node the backend is discarding.
	pub fn discard(&self, node: &NativeNode) {
		let host = self.hosts.borrow_mut().remove(&node.key());
		drop(host);
	}
}
