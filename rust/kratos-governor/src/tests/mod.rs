// Tests module
// Lifecycle invariants: property tests over votes, tallies and execution
// Scenarios: the end-to-end flows the driver scripts exercise

pub mod scenarios;
