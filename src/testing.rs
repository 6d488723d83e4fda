//! In-memory backend the unit tests drive wrappers against.

use std::cell::{Cell, RefCell};

use glam::{vec2, Vec2};

use crate::error::{AdapterResult, PreloadError};
use crate::math::rect::{OrientedBounds, Rect};
use crate::math::transform::{LocalTransform, WorldTransform};
use crate::node::{NativeNode, WeakNativeNode};
use crate::registry::WrapperRegistry;
use crate::scene::{AssetId, PreloadCallback, SceneBackend, SceneData, SceneWrapper};
use crate::wrapper::{Children, NodeWrapper, WrapperType};

#[derive(Default)]
pub struct TestNode {
	name: RefCell<String>,
	parent: RefCell<Option<WeakNativeNode>>,
	children: RefCell<Vec<NativeNode>>,
	position: Cell<Vec2>,
	rotation: Cell<f32>,
	scale: Cell<Vec2>,
}

impl TestNode {
	pub fn new(name: &str) -> Self {
		Self {
			name: RefCell::new(name.to_owned()),
			scale: Cell::new(Vec2::ONE),
			..Default::default()
		}
	}

	pub fn name(&self) -> String {
		self.name.borrow().clone()
	}

	pub fn position(&self) -> Vec2 {
		self.position.get()
	}

	pub fn rotation(&self) -> f32 {
		self.rotation.get()
	}

	pub fn parent(&self) -> Option<NativeNode> {
		self.parent.borrow().as_ref().and_then(WeakNativeNode::upgrade)
	}

	fn local(&self) -> LocalTransform {
		LocalTransform::new()
			.with_position(self.position.get())
			.with_rotation(self.rotation.get())
			.with_scale(self.scale.get())
	}
}

pub struct TestStage {
	name: RefCell<String>,
	children: RefCell<Vec<NativeNode>>,
	position: Cell<Vec2>,
	scale: Cell<Vec2>,
}

impl TestStage {
	pub fn new(name: &str) -> Self {
		Self {
			name: RefCell::new(name.to_owned()),
			children: RefCell::new(Vec::new()),
			position: Cell::new(Vec2::ZERO),
			scale: Cell::new(Vec2::ONE),
		}
	}

	pub fn name(&self) -> String {
		self.name.borrow().clone()
	}

	pub fn children(&self) -> Vec<NativeNode> {
		self.children.borrow().clone()
	}
}

pub fn spawn(name: &str) -> NativeNode {
	NativeNode::new(TestNode::new(name))
}

pub fn stage() -> NativeNode {
	NativeNode::new(TestStage::new("stage"))
}

fn children_cell(node: &NativeNode) -> Option<&RefCell<Vec<NativeNode>>> {
	if let Some(node) = node.downcast_ref::<TestNode>() {
		Some(&node.children)
	} else {
		node.downcast_ref::<TestStage>().map(|stage| &stage.children)
	}
}

/// Appends `child` to the children of `parent`, both being test nodes or stages.
pub fn attach(parent: &NativeNode, child: &NativeNode) {
	if let Some(child_node) = child.downcast_ref::<TestNode>() {
		*child_node.parent.borrow_mut() = Some(parent.downgrade());
	}
	if let Some(children) = children_cell(parent) {
		children.borrow_mut().push(child.clone());
	}
}

fn detach(parent: &NativeNode, child: &NativeNode) {
	if let Some(children) = children_cell(parent) {
		children.borrow_mut().retain(|sibling| sibling != child);
	}
}

pub fn children_of(node: &NativeNode) -> Vec<NativeNode> {
	children_cell(node).map(|children| children.borrow().clone()).unwrap_or_default()
}

/// World transform of everything above `node`.
fn parent_world(node: &TestNode) -> WorldTransform {
	let mut chain = Vec::new();
	let mut parent = node.parent();
	while let Some(ancestor) = parent {
		if let Some(ancestor) = ancestor.downcast_ref::<TestNode>() {
			chain.push(ancestor.local());
			parent = ancestor.parent();
		} else if let Some(stage) = ancestor.downcast_ref::<TestStage>() {
			chain.push(
				LocalTransform::new()
					.with_position(stage.position.get())
					.with_scale(stage.scale.get()),
			);
			parent = None;
		} else {
			parent = None;
		}
	}
	chain
		.iter()
		.rev()
		.fold(WorldTransform::default(), |world, local| world.then(local))
}

#[derive(Default, Clone)]
struct Snapshot {
	name: String,
	local: LocalTransform,
}

pub struct TestWrapper {
	target: NativeNode,
	saved: Option<Snapshot>,
}

impl TestWrapper {
	fn node(&self) -> &TestNode {
		self.target
			.downcast_ref::<TestNode>()
			.expect("TestWrapper is only registered for TestNode")
	}

	fn world(&self) -> WorldTransform {
		let node = self.node();
		parent_world(node).then(&node.local())
	}
}

impl WrapperType for TestWrapper {
	const CLASS_NAME: &'static str = "TestWrapper";

	fn new(target: NativeNode) -> Self {
		Self { target, saved: None }
	}
}

impl NodeWrapper for TestWrapper {
	fn target(&self) -> &NativeNode {
		&self.target
	}

	fn set_target(&mut self, target: NativeNode) {
		self.target = target;
	}

	fn name(&self) -> AdapterResult<String> {
		Ok(self.node().name())
	}

	fn set_name(&mut self, name: &str) -> AdapterResult<()> {
		*self.node().name.borrow_mut() = name.to_owned();
		Ok(())
	}

	fn parent_node(&self) -> AdapterResult<Option<NativeNode>> {
		Ok(self.node().parent())
	}

	fn set_parent_node(&mut self, parent: Option<NativeNode>) -> AdapterResult<()> {
		if let Some(old) = self.node().parent() {
			detach(&old, &self.target);
		}
		*self.node().parent.borrow_mut() = None;
		if let Some(parent) = parent {
			attach(&parent, &self.target);
		}
		Ok(())
	}

	fn child_nodes(&self) -> AdapterResult<Children<'_>> {
		Ok(self.node().children.borrow_mut())
	}

	fn position(&self) -> AdapterResult<Vec2> {
		Ok(self.node().position.get())
	}

	fn set_position(&mut self, position: Vec2) -> AdapterResult<()> {
		self.node().position.set(position);
		Ok(())
	}

	fn rotation(&self) -> AdapterResult<f32> {
		Ok(self.node().rotation.get())
	}

	fn set_rotation(&mut self, rotation: f32) -> AdapterResult<()> {
		self.node().rotation.set(rotation);
		Ok(())
	}

	fn scale(&self) -> AdapterResult<Vec2> {
		Ok(self.node().scale.get())
	}

	fn set_scale(&mut self, scale: Vec2) -> AdapterResult<()> {
		self.node().scale.set(scale);
		Ok(())
	}

	fn world_position(&self) -> AdapterResult<Vec2> {
		Ok(self.world().position())
	}

	fn set_world_position(&mut self, position: Vec2) -> AdapterResult<()> {
		let local = parent_world(self.node()).to_local(position);
		self.set_position(local)
	}

	fn world_rotation(&self) -> AdapterResult<f32> {
		Ok(self.world().rotation)
	}

	fn set_world_rotation(&mut self, rotation: f32) -> AdapterResult<()> {
		let parent = parent_world(self.node());
		self.set_rotation(rotation - parent.rotation)
	}

	fn world_scale(&self) -> AdapterResult<Vec2> {
		Ok(self.world().scale)
	}

	fn world_bounds(&self) -> AdapterResult<Rect> {
		Ok(self.world_oriented_bounds()?.aabb())
	}

	/// Every test node renders a 2x2 square centered on its origin.
	fn world_oriented_bounds(&self) -> AdapterResult<OrientedBounds> {
		let matrix = self.world().matrix;
		Ok(OrientedBounds::from(
			[vec2(-1., -1.), vec2(-1., 1.), vec2(1., 1.), vec2(1., -1.)].map(|corner| matrix.transform_point2(corner)),
		))
	}

	fn create_node(&mut self) -> AdapterResult<NativeNode> {
		let saved = self.saved.clone().unwrap_or_default();
		let node = TestNode::new(&saved.name);
		node.position.set(saved.local.position);
		node.rotation.set(saved.local.rotation);
		node.scale.set(saved.local.scale);
		Ok(NativeNode::new(node))
	}

	fn on_before_serialize(&mut self) {
		let node = self.node();
		self.saved = Some(Snapshot {
			name: node.name(),
			local: node.local(),
		});
	}
}

/// Preloads are held until `finish_preload`, which fails on nil asset ids.
#[derive(Default)]
pub struct TestStageBackend {
	pending: Option<(Vec<AssetId>, PreloadCallback)>,
}

impl TestStageBackend {
	pub fn has_pending_preload(&self) -> bool {
		self.pending.is_some()
	}

	pub fn finish_preload(&mut self) {
		let Some((assets, callback)) = self.pending.take() else {
			return;
		};
		match assets.iter().find(|asset| asset.0.is_nil()) {
			Some(missing) => callback(Err(PreloadError::new(missing.to_string(), "no such asset"))),
			None => callback(Ok(())),
		}
	}
}

impl SceneBackend for TestStageBackend {
	const CLASS_NAME: &'static str = "TestStageWrapper";

	fn name(&self, target: &NativeNode) -> AdapterResult<String> {
		Ok(target.downcast_ref::<TestStage>().map(TestStage::name).unwrap_or_default())
	}

	fn child_nodes<'a>(&'a self, target: &'a NativeNode) -> AdapterResult<Children<'a>> {
		let stage = target
			.downcast_ref::<TestStage>()
			.expect("TestStageBackend is only registered for TestStage");
		Ok(stage.children.borrow_mut())
	}

	fn position(&self, target: &NativeNode) -> AdapterResult<Vec2> {
		Ok(target.downcast_ref::<TestStage>().map_or(Vec2::ZERO, |stage| stage.position.get()))
	}

	fn set_position(&mut self, target: &NativeNode, position: Vec2) -> AdapterResult<()> {
		if let Some(stage) = target.downcast_ref::<TestStage>() {
			stage.position.set(position);
		}
		Ok(())
	}

	fn scale(&self, target: &NativeNode) -> AdapterResult<Vec2> {
		Ok(target.downcast_ref::<TestStage>().map_or(Vec2::ONE, |stage| stage.scale.get()))
	}

	fn set_scale(&mut self, target: &NativeNode, scale: Vec2) -> AdapterResult<()> {
		if let Some(stage) = target.downcast_ref::<TestStage>() {
			stage.scale.set(scale);
		}
		Ok(())
	}

	fn preload_assets(&mut self, assets: &[AssetId], callback: PreloadCallback) {
		self.pending = Some((assets.to_vec(), callback));
	}

	fn create_node(&mut self, data: Option<&SceneData>) -> AdapterResult<NativeNode> {
		let Some(SceneData(data)) = data else {
			return Ok(stage());
		};
		let node = NativeNode::new(TestStage::new(data["name"].as_str().unwrap_or("stage")));
		for child in data["children"].members() {
			attach(&node, &spawn(child.as_str().unwrap_or_default()));
		}
		Ok(node)
	}
}

/// A registry knowing both test node kinds, with a fresh stage to hang nodes under.
pub fn registry_with_scene() -> (WrapperRegistry, NativeNode) {
	let registry = WrapperRegistry::new();
	registry
		.register::<TestNode, TestWrapper>()
		.expect("TestNode registers once");
	registry
		.register::<TestStage, SceneWrapper<TestStageBackend>>()
		.expect("TestStage registers once");
	(registry, stage())
}
