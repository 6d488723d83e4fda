use std::cell::{Cell, RefCell};
use std::error::Error;
use std::rc::Rc;

use clap::Parser;
use glam::{vec2, Vec2};
use tracing::{info, warn};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

use stagehand::hierarchy::HierarchyDump;
use stagehand::mixin::{MixinClass, MixinComposer};
use stagehand::node::WeakNativeNode;
use stagehand::scene::{SceneBackend, SceneData, SceneWrapper};
use stagehand::wrapper::Children;
use stagehand::{AdapterError, AdapterResult, NativeNode, NodeWrapper, WrapperRegistry, WrapperType};

/// A sprite as some game runtime might keep it.
struct Sprite {
	name: String,
	level: WeakNativeNode,
	// sprites never get children, but the dump still asks for them
	children: RefCell<Vec<NativeNode>>,
	position: Cell<Vec2>,
	rotation: Cell<f32>,
}

/// Root of a level. Sprites sit directly under it.
#[derive(Default)]
struct Level {
	sprites: RefCell<Vec<NativeNode>>,
	camera: Cell<Vec2>,
}

struct SpriteWrapper {
	target: NativeNode,
}

impl SpriteWrapper {
	fn sprite(&self) -> Option<&Sprite> {
		self.target.downcast_ref()
	}
}

impl WrapperType for SpriteWrapper {
	const CLASS_NAME: &'static str = "SpriteWrapper";

	fn new(target: NativeNode) -> Self {
		Self { target }
	}
}

impl NodeWrapper for SpriteWrapper {
	fn target(&self) -> &NativeNode {
		&self.target
	}

	fn set_target(&mut self, target: NativeNode) {
		self.target = target;
	}

	fn name(&self) -> AdapterResult<String> {
		Ok(self.sprite().map(|sprite| sprite.name.clone()).unwrap_or_default())
	}

	fn parent_node(&self) -> AdapterResult<Option<NativeNode>> {
		Ok(self.sprite().and_then(|sprite| sprite.level.upgrade()))
	}

	fn child_nodes(&self) -> AdapterResult<Children<'_>> {
		match self.sprite() {
			Some(sprite) => Ok(sprite.children.borrow_mut()),
			None => Err(AdapterError::Disallowed("target is not a sprite")),
		}
	}

	fn position(&self) -> AdapterResult<Vec2> {
		Ok(self.sprite().map_or(Vec2::ZERO, |sprite| sprite.position.get()))
	}

	fn set_position(&mut self, position: Vec2) -> AdapterResult<()> {
		if let Some(sprite) = self.sprite() {
			sprite.position.set(position);
		}
		Ok(())
	}

	fn rotation(&self) -> AdapterResult<f32> {
		Ok(self.sprite().map_or(0., |sprite| sprite.rotation.get()))
	}

	fn set_rotation(&mut self, rotation: f32) -> AdapterResult<()> {
		if let Some(sprite) = self.sprite() {
			sprite.rotation.set(rotation);
		}
		Ok(())
	}

	// levels are never moved, a sprite's world space is its local space

	fn world_position(&self) -> AdapterResult<Vec2> {
		self.position()
	}

	fn set_world_position(&mut self, position: Vec2) -> AdapterResult<()> {
		self.set_position(position)
	}
}

#[derive(Default)]
struct LevelBackend;

impl SceneBackend for LevelBackend {
	const CLASS_NAME: &'static str = "LevelWrapper";

	fn name(&self, _target: &NativeNode) -> AdapterResult<String> {
		Ok("level".to_owned())
	}

	fn child_nodes<'a>(&'a self, target: &'a NativeNode) -> AdapterResult<Children<'a>> {
		match target.downcast_ref::<Level>() {
			Some(level) => Ok(level.sprites.borrow_mut()),
			None => Err(AdapterError::Disallowed("target is not a level")),
		}
	}

	fn position(&self, target: &NativeNode) -> AdapterResult<Vec2> {
		Ok(target.downcast_ref::<Level>().map_or(Vec2::ZERO, |level| level.camera.get()))
	}

	fn set_position(&mut self, target: &NativeNode, position: Vec2) -> AdapterResult<()> {
		if let Some(level) = target.downcast_ref::<Level>() {
			level.camera.set(position);
		}
		Ok(())
	}

	fn create_node(&mut self, _data: Option<&SceneData>) -> AdapterResult<NativeNode> {
		Ok(NativeNode::new(Level::default()))
	}
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
	#[arg(long, default_value_t = 4, help = "Number of sprites to put in the level")]
	sprites: usize,
	#[arg(
		long,
		default_value_t = 0,
		allow_hyphen_values = true,
		help = "Sibling index to move the last sprite to, -1 for last"
	)]
	move_last_to: i32,
	#[arg(long, default_value_t = 90., help = "Degrees to rotate the first sprite around the origin")]
	angle: f32,
}

fn main() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	tracing_subscriber::registry()
		.with(fmt::layer())
		.with(LevelFilter::INFO)
		.init();

	let registry = WrapperRegistry::new();
	registry.register::<Sprite, SpriteWrapper>()?;
	registry.register::<Level, SceneWrapper<LevelBackend>>()?;

	let level = LevelBackend.create_node(None)?;
	let Some(level_node) = level.downcast_ref::<Level>() else {
		return Err("level backend built something else".into());
	};
	for i in 0..cli.sprites {
		let sprite = NativeNode::new(Sprite {
			name: format!("sprite {i}"),
			level: level.downgrade(),
			children: RefCell::new(Vec::new()),
			position: Cell::new(vec2(i as f32 * 10., 0.)),
			rotation: Cell::new(0.),
		});
		level_node.sprites.borrow_mut().push(sprite);
	}
	registry.set_current_scene(&level)?;
	info!("Level built with {} sprites", cli.sprites);

	let sprites = level_node.sprites.borrow().clone();
	if let Some(last) = sprites.last() {
		let wrapper = registry.get_wrapper(last)?;
		wrapper.borrow_mut().set_sibling_index(&registry, cli.move_last_to)?;
		info!(
			"Moved {} to index {}",
			wrapper.borrow().name()?,
			wrapper.borrow().sibling_index(&registry)
		);
	}

	if let Some(first) = sprites.first() {
		let wrapper = registry.get_wrapper(first)?;
		let mut wrapper = wrapper.borrow_mut();
		wrapper.set_position(vec2(10., 0.))?;
		wrapper.rotate_around(Vec2::ZERO, cli.angle)?;
		info!(
			"Rotated {} to {} ({} degrees)",
			wrapper.name()?,
			wrapper.world_position()?,
			wrapper.rotation()?
		);
		if let Err(e) = wrapper.set_x(f32::NAN) {
			warn!("Rejected as expected: {e}");
		}
	}

	let composer = MixinComposer::new();
	let blinking = Rc::new(MixinClass::named("Blinking").with_state(|_, components| components.insert(0.5f32)));
	for sprite in sprites.iter().step_by(2) {
		composer.mixin(sprite, &blinking)?;
	}

	let Some(scene) = registry.current_scene() else {
		return Err("no current scene".into());
	};
	let root = scene.borrow().target().clone();
	info!("Hierarchy:\n{}", HierarchyDump::new(&registry, &root).with_mixins(&composer));

	Ok(())
}
