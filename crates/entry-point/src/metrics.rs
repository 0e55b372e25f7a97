use metrics::{counter, describe_counter};

const HANDLED_OPS: &str = "warden_entry_point_handled_ops";
const VALIDATION_FAILED: &str = "warden_entry_point_validation_failed";
const EXECUTION_REVERTED: &str = "warden_entry_point_execution_reverted";

pub(crate) fn record_handled_op(success: bool) {
    counter!(HANDLED_OPS, "success" => success.to_string()).increment(1);
}

pub(crate) fn record_validation_failure(code: &'static str) {
    counter!(VALIDATION_FAILED, "code" => code).increment(1);
}

pub(crate) fn record_execution_revert() {
    counter!(EXECUTION_REVERTED).increment(1);
}

pub fn describe_entry_point_metrics() {
    describe_counter!(HANDLED_OPS, "user operations executed by the entry point");
    describe_counter!(VALIDATION_FAILED, "user operations rejected during validation");
    describe_counter!(EXECUTION_REVERTED, "user operations whose execution reverted");
}
