use crate::{ArchiveMode, Channel, ContentId, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StoreAdd {
        request: RequestId,
        key: ContentId,
        mode: ArchiveMode,
        channel: Channel,
    },
    StoreRemove {
        key: ContentId,
        channel: Channel,
    },
    StatusAll {
        channel: Channel,
    },
    StatusOne {
        key: ContentId,
        channel: Channel,
    },
    Say {
        channel: Channel,
        text: String,
    },
    JoinSwarm {
        key: ContentId,
    },
    LeaveSwarm {
        key: ContentId,
    },
}
