pub(crate) mod distribute;
pub(crate) mod factory;
pub(crate) mod model;
pub(crate) mod preset;
pub(crate) mod store;
