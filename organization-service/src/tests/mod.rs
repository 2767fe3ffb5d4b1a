mod cli;
mod drive;
mod global;
mod lifecycle;
mod mongo;
