mod cli;
mod gate;
