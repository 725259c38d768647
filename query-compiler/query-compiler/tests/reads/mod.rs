mod abstract_types;
mod aggregations;
mod authorization;
mod filtering;
mod projection;
