pub mod attempt_writer;
