// Client layer: built-in harvest registries, one module per monitored trigger group.

pub mod particlenet;
