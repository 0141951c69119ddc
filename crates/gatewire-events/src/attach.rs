//! Attach pass: copy one attribute of a decoded event onto a nested model.

use tracing::trace;

use crate::descriptor::AttachRule;
use crate::event::{AttachReport, DecodedEvent};

impl AttachRule {
    /// Apply this rule to `event`. Returns whether the write happened; an
    /// unreadable source or unreachable destination leaves the event untouched.
    pub(crate) fn apply(&self, event: &mut DecodedEvent) -> bool {
        let value = match event.get(&self.source) {
            Ok(value) if !value.is_null() => value.into_owned(),
            _ => return false,
        };
        event
            .model_mut(&self.dest_field)
            .is_some_and(|target| target.set(&self.dest_attribute, value))
    }
}

/// Run every attach rule of the event's descriptor in declaration order.
pub(crate) fn apply_all(event: &mut DecodedEvent) -> AttachReport {
    let descriptor = event.descriptor_arc();
    let mut report = AttachReport::default();
    for rule in descriptor.attach_rules() {
        if rule.apply(event) {
            report.applied += 1;
        } else {
            trace!(event = descriptor.name(), %rule, "attach rule skipped");
            report.skipped += 1;
        }
    }
    event.set_attach_report(report);
    report
}
