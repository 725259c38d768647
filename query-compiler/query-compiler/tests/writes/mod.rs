mod create;
mod delete;
mod events;
mod nested;
mod update;
