pub mod stub_engine;
