// tests/integration.rs

mod integration {
    mod error_handling;
    mod fs_abstraction;
}
