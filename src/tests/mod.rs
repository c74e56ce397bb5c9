// Telemetry test suite


#[cfg(test)]
mod buffer_tests;

#[cfg(test)]
mod collector_tests;

#[cfg(test)]
mod analyzer_tests;


#[cfg(test)]
mod config_tests;
