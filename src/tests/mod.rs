// Test modules for upnp-cli
// Shared doubles live in `support`; each other module covers one layer

mod support;

mod keep_tests;
