use anyhow::Result;
use futures_util::{Stream, StreamExt};
use heroroll_model::hero::{HeroName, RoleFilter};
use heroroll_model::PlayerSlot;
use log::error;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::{Receiver, Sender};
use tokio_stream::wrappers::BroadcastStream;

use super::ui_state::UiState;

#[derive(Clone)]
pub(crate) struct MessageBus(Sender<Message>);

impl MessageBus {
    pub fn new() -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(100);
        Self(sender)
    }

    pub fn send(&self, message: Message) {
        if let Err(message) = self.0.send(message) {
            error!("Message not sent {:?}", message);
        }
    }

    pub fn subscribe(&self) -> MessageBusSubscription {
        MessageBusSubscription(self.0.subscribe())
    }
}

pub(crate) struct MessageBusSubscription(Receiver<Message>);

impl MessageBusSubscription {
    pub fn stream(self) -> impl Stream<Item = Result<Message>> {
        BroadcastStream::new(self.0).map(|r| r.map_err(anyhow::Error::from))
    }

    pub fn ui_update_stream(self) -> impl Stream<Item = Result<UiUpdate>> {
        self.stream().filter_map(|r| async move {
            match r {
                Ok(Message::UiUpdate(ui_update)) => Some(Ok(ui_update)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    pub fn ui_command_stream(self) -> impl Stream<Item = Result<UiCommand>> {
        self.stream().filter_map(|r| async move {
            match r {
                Ok(Message::UiCommand(ui_command)) => Some(Ok(ui_command)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Message {
    UiUpdate(UiUpdate),
    UiCommand(UiCommand),
}

impl From<UiState> for Message {
    fn from(value: UiState) -> Self {
        Message::UiUpdate(UiUpdate::State(value))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UiUpdate {
    State(UiState),
}

#[derive(Clone, Debug)]
pub enum UiCommand {
    InitializeUi,
    SetPlayerCount(u8),
    SetPlayerRole(PlayerSlot, RoleFilter),
    SetPlayerName(PlayerSlot, String),
    SetListRole(RoleFilter),
    SetChallengeMode(bool),
    SetNoRepeat(bool),
    ToggleBan(HeroName),
    SetAllBanned {
        heroes: Vec<HeroName>,
        banned: bool,
    },
    Roll,
    ClearPicks,
    ClearHistory,
    MarkComplete {
        slot: PlayerSlot,
        hero: Option<HeroName>,
    },
    MarkAllComplete,
    UndoComplete {
        slot: PlayerSlot,
        hero: HeroName,
    },
    ClearFilters,
    ResetChallenge,
    FactoryReset,
    CloseApplication,
}
