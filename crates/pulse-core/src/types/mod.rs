pub mod activity;
pub mod chat;
pub mod enums;
pub mod event;
pub mod ids;
pub mod insight;
pub mod io;
pub mod market_gap;
pub mod my_event;
pub mod profile;
pub mod sponsor;
pub mod task;

pub use activity::{Activity, ACTIVITY_RETENTION};
pub use chat::ChatMessage;
pub use enums::*;
pub use event::{
    AgeRange, Attendance, BudgetRange, Demographics, Event, GenderSplit, MediaMetrics,
    SponsorAssociation, SuccessMetrics, Verification, DEFAULT_CURRENCY,
};
pub use ids::*;
pub use insight::{EventAnalysisReport, GapInsight, InsightOrigin, SponsorMatch, SponsorshipStrategy};
pub use io::*;
pub use market_gap::MarketGap;
pub use my_event::MyEvent;
pub use profile::Profile;
pub use sponsor::{ContactInfo, Sponsor, SponsorIntel, TargetDemographics};
pub use task::{Task, TaskLink};
