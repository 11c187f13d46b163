pub mod builder;
pub mod logical_aggregate;
pub mod logical_create;
pub mod logical_filter;
pub mod logical_join;
pub mod logical_process;
pub mod logical_project;
pub mod logical_subquery_alias;
pub mod logical_table;
pub mod logical_values;
pub mod operator;
