pub(crate) mod cache;
pub(crate) mod decode;
pub(crate) mod fetch;
pub(crate) mod loader;
pub(crate) mod source;
