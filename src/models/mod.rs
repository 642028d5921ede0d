mod notification;

pub use notification::{
    Channel, MultiChannelOutcome, NotificationRecord, NotificationStats, NotificationStatus,
};
