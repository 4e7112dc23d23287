//! Session listing pipeline stages after authorization

pub mod assembler;
pub mod retriever;
pub mod shaping;
pub mod types;

pub use assembler::assemble;
pub use retriever::{Retrieval, SessionRetriever};
pub use shaping::{annotate_for_instructor, shape, shape_for_student, MembershipIndex};
pub use types::{
    FeedbackSessionData, FeedbackSessionsData, FeedbackSessionsRequest, InstructorOnlyFields,
    PublishStatus, SubmissionStatus,
};
