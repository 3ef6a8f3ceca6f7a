#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("failed to receive messages from the capture queue")]
    ReceiveFailed,
    #[error("failed to acknowledge message {message_id}")]
    AcknowledgeFailed { message_id: String },
    #[error("failed to schedule retry for message {message_id}")]
    ScheduleRetryFailed { message_id: String },
    #[error("failed to publish capture work for charge {charge_external_id}")]
    PublishFailed { charge_external_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("failed to send payment confirmation for charge {charge_external_id}")]
    SendFailed { charge_external_id: String },
}
