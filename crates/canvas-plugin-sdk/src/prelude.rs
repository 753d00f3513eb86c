//! Prelude for handler authors.

pub use canvas_plugin::prelude::*;

pub use crate::effects::{
    AddBannerAlert, AddTask, BannerIntent, BannerPlacement, CardStatus, EffectBuilder, Log,
    ProtocolCard, Recommendation, RemoveBannerAlert, TaskStatus,
};
