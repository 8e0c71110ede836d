pub(crate) mod fallback;
pub(crate) mod resolver;
