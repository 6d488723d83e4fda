use std::fmt::{self, Display};

use crate::mixin::MixinComposer;
use crate::node::NativeNode;
use crate::registry::WrapperRegistry;

/// Displays the tree under a node, read entirely through the bound wrappers.
///
/// ```text
/// - [SceneWrapper] level
///   - [SpriteWrapper] player (Damageable)
///   - [SpriteWrapper] enemy
/// ```
pub struct HierarchyDump<'a> {
	registry: &'a WrapperRegistry,
	root: NativeNode,
	mixins: Option<&'a MixinComposer>,
}

impl<'a> HierarchyDump<'a> {
	pub fn new(registry: &'a WrapperRegistry, root: &NativeNode) -> Self {
		Self {
			registry,
			root: root.clone(),
			mixins: None,
		}
	}

	/// Also lists the classes mixed into each node.
	pub fn with_mixins(mut self, mixins: &'a MixinComposer) -> Self {
		self.mixins = Some(mixins);
		self
	}

	fn rec_fmt(&self, indent: usize, f: &mut fmt::Formatter<'_>, node: &NativeNode) -> fmt::Result {
		let indent_str = "  ".repeat(indent);
		let Ok(wrapper) = self.registry.get_wrapper(node) else {
			return writeln!(f, "{indent_str}- [?] {}", node.kind());
		};
		let Some(class) = self.registry.wrapper_class(node) else {
			return Ok(());
		};

		let (name, children) = match wrapper.try_borrow() {
			Ok(wrapper) => {
				let name = wrapper.name().unwrap_or_default();
				let children = wrapper
					.child_nodes()
					.map(|children| children.clone())
					.unwrap_or_default();
				(name, children)
			}
			Err(_) => ("(busy)".to_owned(), Vec::new()),
		};

		let class_name = class.name;
		#[cfg(feature = "owo")]
		let class_name = {
			use owo_colors::OwoColorize;
			class_name.magenta()
		};

		write!(f, "{indent_str}- [{class_name}] {name}")?;
		if let Some(mixins) = self.mixins {
			let record = mixins.mixin_record(node);
			if !record.is_empty() {
				let ids: Vec<String> = record
					.iter()
					.filter_map(|class| class.id().map(ToString::to_string))
					.collect();
				write!(f, " ({})", ids.join(", "))?;
			}
		}
		writeln!(f)?;

		for child in &children {
			self.rec_fmt(indent + 1, f, child)?;
		}
		Ok(())
	}
}

impl Display for HierarchyDump<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.rec_fmt(0, f, &self.root)
	}
}
