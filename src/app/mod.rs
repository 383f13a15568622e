// Application layer: concrete probe families built on the core engine.

pub mod families;
