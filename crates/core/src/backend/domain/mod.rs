pub mod check_in_client;
