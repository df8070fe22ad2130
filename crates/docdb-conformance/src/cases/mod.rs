pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod find;
pub(crate) mod read;
pub(crate) mod replace;
pub(crate) mod update;
