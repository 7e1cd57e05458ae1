pub(crate) mod element;
pub(crate) mod group;
