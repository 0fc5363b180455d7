pub mod session_file;
