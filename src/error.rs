use crate::node::NodeKind;

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Everything that can go wrong while driving a node through its wrapper.
///
/// None of these are fatal. They are logged where they are detected and handed back
/// so the caller can fall back to a default and carry on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterError {
	#[error("{0} is not yet implemented by this backend")]
	NotImplemented(&'static str),
	#[error("The {0} must not be NaN")]
	NaN(&'static str),
	#[error("Disallowed: {0}")]
	Disallowed(&'static str),
	#[error("No wrapper registered for {0}")]
	NotRegistered(NodeKind),
	#[error("Wrapper type for {0} is already registered")]
	AlreadyRegistered(NodeKind),
	#[error("Invalid wrapper type for {0}: missing class name")]
	InvalidWrapperType(NodeKind),
	#[error("The class to mixin must have a class name or script uuid")]
	MixinIdentityMissing,
	#[error("Node has no mixin member {0:?}")]
	UnknownMember(String),
	#[error("Node has no parent")]
	Orphan,
	#[error("Node is not listed among its parent's children")]
	NotAChild,
	#[error("Wrapper is already in use")]
	WrapperBusy,
	#[error("Mixin components are already in use")]
	ComponentsBusy,
	#[error("Node has no {0} component")]
	MissingComponent(&'static str),
	#[error(transparent)]
	Preload(#[from] PreloadError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Failed to preload asset {asset}\n  - {msg}")]
pub struct PreloadError {
	pub asset: String,
	pub msg: String,
}

impl PreloadError {
	pub fn new(asset: impl Into<String>, msg: impl Into<String>) -> Self {
		Self {
			asset: asset.into(),
			msg: msg.into(),
		}
	}
}
