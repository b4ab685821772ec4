pub mod replay_file;
