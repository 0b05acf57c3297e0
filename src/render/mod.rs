pub(crate) mod backend;
pub(crate) mod blend;
pub(crate) mod composite;
pub(crate) mod plan;
pub(crate) mod resample;
