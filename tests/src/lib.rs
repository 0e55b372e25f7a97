//! End-to-end scenarios of delegated accounts driven through the entry point


#[cfg(test)]
mod access_control_tests;
#[cfg(test)]
mod entry_point_tests;
