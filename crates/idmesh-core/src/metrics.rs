// Metrics for cluster coordination
// Counters and gauges recorded by election, membership and replication

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Initialize cluster metric descriptions
/// Should be called once at application startup
pub fn init_metrics() {
    // Election metrics
    describe_counter!(
        "election_rounds_total",
        "Total number of election rounds started"
    );
    describe_counter!("elections_won_total", "Total number of elections won");
    describe_counter!(
        "election_timeouts_total",
        "Total number of elections abandoned after the maximum rounds"
    );

    // Membership metrics
    describe_gauge!("cluster_members_total", "Total number of cluster members");
    describe_counter!(
        "fan_out_failures_total",
        "Total number of failed best-effort peer notifications"
    );

    // Replication metrics
    describe_counter!(
        "checkpoints_total",
        "Total number of checkpoint attempts"
    );
    describe_counter!(
        "catch_up_syncs_total",
        "Total number of catch-up attempts against the leader"
    );
}

pub fn record_election_round() {
    counter!("election_rounds_total").increment(1);
}

pub fn record_election_won() {
    counter!("elections_won_total").increment(1);
}

pub fn record_election_timeout() {
    counter!("election_timeouts_total").increment(1);
}

pub fn set_cluster_members(total: usize) {
    gauge!("cluster_members_total").set(total as f64);
}

pub fn record_fan_out_failure(operation: &str) {
    counter!("fan_out_failures_total", "operation" => operation.to_string()).increment(1);
}

/// Record a checkpoint attempt
pub fn record_checkpoint(success: bool) {
    counter!("checkpoints_total", "result" => if success { "success" } else { "failure" })
        .increment(1);
}

/// Record a catch-up attempt
pub fn record_catch_up(success: bool) {
    counter!("catch_up_syncs_total", "result" => if success { "success" } else { "failure" })
        .increment(1);
}
