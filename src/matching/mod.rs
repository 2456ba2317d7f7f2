pub mod fuzzy_resolver;
