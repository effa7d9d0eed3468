mod support;

mod revocation_tests;
