// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Known action kinds and the payload shape each one carries.
//!
//! The catalog is the contract negotiated between the embed bundle and the
//! host bundle. It is open-ended: buses accept any action type string, and the
//! typed structs here are for producers and consumers that opt in.
//!
//! Kinds prefixed with `__` are internal lifecycle/control messages between
//! the embed runtime and its host glue. Deprecated kinds are still fired next
//! to their V2 successors; older hosts listen for them.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ActionError, INTERNAL_PREFIX};

/// Enumerated action kinds understood by both sides of the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// An event type was picked in the widget.
    #[serde(rename = "eventTypeSelected")]
    EventTypeSelected,
    /// The embedded link could not be loaded.
    #[serde(rename = "linkFailed")]
    LinkFailed,
    /// The embedded link finished loading.
    #[serde(rename = "linkReady")]
    LinkReady,
    /// A booking was made (compact payload).
    #[serde(rename = "bookingSuccessfulV2")]
    BookingSuccessfulV2,
    /// A booking was made (full objects). Superseded by `bookingSuccessfulV2`.
    #[serde(rename = "bookingSuccessful")]
    BookingSuccessful,
    /// A booking was rescheduled (compact payload).
    #[serde(rename = "rescheduleBookingSuccessfulV2")]
    RescheduleBookingSuccessfulV2,
    /// A booking was rescheduled (full objects). Superseded by `rescheduleBookingSuccessfulV2`.
    #[serde(rename = "rescheduleBookingSuccessful")]
    RescheduleBookingSuccessful,
    /// A booking was cancelled.
    #[serde(rename = "bookingCancelled")]
    BookingCancelled,
    /// A routing form resolved to an action.
    #[serde(rename = "routed")]
    Routed,
    /// The widget navigated to the booker view.
    #[serde(rename = "navigatedToBooker")]
    NavigatedToBooker,
    /// Host started a connect handshake.
    #[serde(rename = "__connectInitiated")]
    ConnectInitiated,
    /// Connect handshake finished.
    #[serde(rename = "__connectCompleted")]
    ConnectCompleted,
    /// Route inside the frame changed.
    #[serde(rename = "__routeChanged")]
    RouteChanged,
    /// Frame window `load` fired.
    #[serde(rename = "__windowLoadComplete")]
    WindowLoadComplete,
    /// Widget asks the host to close the frame.
    #[serde(rename = "__closeIframe")]
    CloseIframe,
    /// Frame is ready to receive messages.
    #[serde(rename = "__iframeReady")]
    IframeReady,
    /// Frame content size changed.
    #[serde(rename = "__dimensionChanged")]
    DimensionChanged,
    /// Widget asks the host to scroll the page.
    #[serde(rename = "__scrollByDistance")]
    ScrollByDistance,
}

impl ActionKind {
    /// Every catalog entry, public kinds first.
    pub const ALL: [Self; 18] = [
        Self::EventTypeSelected,
        Self::LinkFailed,
        Self::LinkReady,
        Self::BookingSuccessfulV2,
        Self::BookingSuccessful,
        Self::RescheduleBookingSuccessfulV2,
        Self::RescheduleBookingSuccessful,
        Self::BookingCancelled,
        Self::Routed,
        Self::NavigatedToBooker,
        Self::ConnectInitiated,
        Self::ConnectCompleted,
        Self::RouteChanged,
        Self::WindowLoadComplete,
        Self::CloseIframe,
        Self::IframeReady,
        Self::DimensionChanged,
        Self::ScrollByDistance,
    ];

    /// Action type string as it appears in wire names and envelopes.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EventTypeSelected => "eventTypeSelected",
            Self::LinkFailed => "linkFailed",
            Self::LinkReady => "linkReady",
            Self::BookingSuccessfulV2 => "bookingSuccessfulV2",
            Self::BookingSuccessful => "bookingSuccessful",
            Self::RescheduleBookingSuccessfulV2 => "rescheduleBookingSuccessfulV2",
            Self::RescheduleBookingSuccessful => "rescheduleBookingSuccessful",
            Self::BookingCancelled => "bookingCancelled",
            Self::Routed => "routed",
            Self::NavigatedToBooker => "navigatedToBooker",
            Self::ConnectInitiated => "__connectInitiated",
            Self::ConnectCompleted => "__connectCompleted",
            Self::RouteChanged => "__routeChanged",
            Self::WindowLoadComplete => "__windowLoadComplete",
            Self::CloseIframe => "__closeIframe",
            Self::IframeReady => "__iframeReady",
            Self::DimensionChanged => "__dimensionChanged",
            Self::ScrollByDistance => "__scrollByDistance",
        }
    }

    /// True for lifecycle/control kinds carrying the reserved `__` prefix.
    pub fn is_internal(self) -> bool {
        self.as_str().starts_with(INTERNAL_PREFIX)
    }

    /// True for kinds kept only for hosts that predate their V2 successor.
    pub const fn is_deprecated(self) -> bool {
        self.successor().is_some()
    }

    /// Replacement kind for a deprecated entry.
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::BookingSuccessful => Some(Self::BookingSuccessfulV2),
            Self::RescheduleBookingSuccessful => Some(Self::RescheduleBookingSuccessfulV2),
            _ => None,
        }
    }

    /// Check `data` against the payload shape declared for this kind.
    ///
    /// Buses never call this; it is for tooling and producers that want to
    /// catch drift before firing.
    pub fn validate(self, data: &serde_json::Value) -> Result<(), ActionError> {
        fn check<A: Action>(data: &serde_json::Value) -> Result<(), ActionError> {
            A::deserialize(data)?;
            Ok(())
        }
        match self {
            Self::EventTypeSelected => check::<EventTypeSelected>(data),
            Self::LinkFailed => check::<LinkFailed>(data),
            Self::LinkReady => check::<LinkReady>(data),
            Self::BookingSuccessfulV2 => check::<BookingSuccessfulV2>(data),
            Self::BookingSuccessful => check::<BookingSuccessful>(data),
            Self::RescheduleBookingSuccessfulV2 => check::<RescheduleBookingSuccessfulV2>(data),
            Self::RescheduleBookingSuccessful => check::<RescheduleBookingSuccessful>(data),
            Self::BookingCancelled => check::<BookingCancelled>(data),
            Self::Routed => check::<Routed>(data),
            Self::NavigatedToBooker => check::<NavigatedToBooker>(data),
            Self::ConnectInitiated => check::<ConnectInitiated>(data),
            Self::ConnectCompleted => check::<ConnectCompleted>(data),
            Self::RouteChanged => check::<RouteChanged>(data),
            Self::WindowLoadComplete => check::<WindowLoadComplete>(data),
            Self::CloseIframe => check::<CloseIframe>(data),
            Self::IframeReady => check::<IframeReady>(data),
            Self::DimensionChanged => check::<DimensionChanged>(data),
            Self::ScrollByDistance => check::<ScrollByDistance>(data),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ActionKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for ActionKind {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ActionError::UnknownAction(s.to_owned()))
    }
}

/// A typed payload bound to one catalog entry.
pub trait Action: Serialize + DeserializeOwned {
    /// Catalog entry this payload is fired under.
    const KIND: ActionKind;
}

macro_rules! bind_action {
    ($($payload:ty => $kind:ident),* $(,)?) => {
        $(impl Action for $payload {
            const KIND: ActionKind = ActionKind::$kind;
        })*
    };
}

bind_action! {
    EventTypeSelected => EventTypeSelected,
    LinkFailed => LinkFailed,
    LinkReady => LinkReady,
    BookingSuccessfulV2 => BookingSuccessfulV2,
    BookingSuccessful => BookingSuccessful,
    RescheduleBookingSuccessfulV2 => RescheduleBookingSuccessfulV2,
    RescheduleBookingSuccessful => RescheduleBookingSuccessful,
    BookingCancelled => BookingCancelled,
    Routed => Routed,
    NavigatedToBooker => NavigatedToBooker,
    ConnectInitiated => ConnectInitiated,
    ConnectCompleted => ConnectCompleted,
    RouteChanged => RouteChanged,
    WindowLoadComplete => WindowLoadComplete,
    CloseIframe => CloseIframe,
    IframeReady => IframeReady,
    DimensionChanged => DimensionChanged,
    ScrollByDistance => ScrollByDistance,
}

/// `eventTypeSelected` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeSelected {
    /// Selected event type object, opaque to this layer.
    pub event_type: serde_json::Value,
}

/// `linkFailed` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFailed {
    /// Failure code (HTTP status or symbolic).
    pub code: String,
    /// Human-readable message.
    pub msg: String,
    /// Failure context.
    pub data: LinkFailedData,
}

/// Context attached to [`LinkFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFailedData {
    /// URL that failed to load.
    pub url: String,
}

/// Start/end pair of one occurrence of a recurring booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSlot {
    /// ISO-8601 start.
    pub start_time: String,
    /// ISO-8601 end.
    pub end_time: String,
}

/// Compact booking fields shared by the V2 success payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    /// Booking uid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Booking title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// ISO-8601 start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// ISO-8601 end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Event type id; rendered as `null` when unknown.
    #[serde(default)]
    pub event_type_id: Option<i64>,
    /// Booking status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Whether payment is still required.
    pub payment_required: bool,
    /// Whether this is a recurring booking.
    pub is_recurring: bool,
    /// Every occurrence; recurring bookings only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_bookings: Option<Vec<BookingSlot>>,
}

/// `bookingSuccessfulV2` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSuccessfulV2 {
    /// Booking fields.
    #[serde(flatten)]
    pub summary: BookingSummary,
    /// Conferencing link, when the booking has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_call_url: Option<String>,
}

/// `rescheduleBookingSuccessfulV2` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RescheduleBookingSuccessfulV2(pub BookingSummary);

/// Organizer contact carried by legacy booking payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organizer {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// IANA time zone.
    pub time_zone: String,
}

/// Body shared by the deprecated booking success payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyBookingDetails {
    /// Full booking object.
    pub booking: serde_json::Value,
    /// Full event type object.
    pub event_type: serde_json::Value,
    /// Booking date.
    pub date: String,
    /// Duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Organizer contact.
    pub organizer: Organizer,
    /// Whether the booking is confirmed.
    pub confirmed: bool,
}

/// `bookingSuccessful` payload (deprecated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingSuccessful(pub LegacyBookingDetails);

/// `rescheduleBookingSuccessful` payload (deprecated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RescheduleBookingSuccessful(pub LegacyBookingDetails);

/// Organizer contact on a cancellation; time zone may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationOrganizer {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// IANA time zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// `bookingCancelled` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCancelled {
    /// Cancelled booking object.
    pub booking: serde_json::Value,
    /// Organizer contact.
    pub organizer: CancellationOrganizer,
    /// Event type object.
    pub event_type: serde_json::Value,
}

/// What a routing form resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoutingAction {
    /// Show a custom message.
    CustomPageMessage,
    /// Redirect to an external URL.
    ExternalRedirectUrl,
    /// Redirect to an event type booking page.
    EventTypeRedirectUrl,
}

/// `routed` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routed {
    /// Kind of routing outcome.
    pub action_type: RoutingAction,
    /// Message text or target URL.
    pub action_value: String,
}

/// `__iframeReady` payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IframeReady {
    /// Frame was loaded ahead of being shown.
    pub is_prerendering: bool,
}

/// `__dimensionChanged` payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionChanged {
    /// Content height in CSS pixels.
    pub iframe_height: f64,
    /// Content width in CSS pixels.
    pub iframe_width: f64,
    /// First measurement after load.
    pub is_first_time: bool,
}

/// `__scrollByDistance` payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollByDistance {
    /// Distance in pixels to scroll by.
    pub distance: f64,
}

macro_rules! empty_payloads {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
            pub struct $name {}
        )*
    };
}

empty_payloads! {
    /// `linkReady` payload.
    LinkReady,
    /// `navigatedToBooker` payload.
    NavigatedToBooker,
    /// `__connectInitiated` payload.
    ConnectInitiated,
    /// `__connectCompleted` payload.
    ConnectCompleted,
    /// `__routeChanged` payload.
    RouteChanged,
    /// `__windowLoadComplete` payload.
    WindowLoadComplete,
    /// `__closeIframe` payload.
    CloseIframe,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_kind_parses_back_from_its_name() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                json!(kind.as_str()),
                "serde name drifted for {kind:?}"
            );
        }
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let err = "*".parse::<ActionKind>().unwrap_err();
        assert!(matches!(err, ActionError::UnknownAction(ref s) if s == "*"));
    }

    #[test]
    fn internal_kinds_use_reserved_prefix() {
        let internal: Vec<_> = ActionKind::ALL
            .into_iter()
            .filter(|k| k.is_internal())
            .collect();
        assert_eq!(internal.len(), 8);
        assert!(!ActionKind::LinkReady.is_internal());
        assert!(ActionKind::IframeReady.is_internal());
    }

    #[test]
    fn deprecated_kinds_point_at_successors() {
        assert!(ActionKind::BookingSuccessful.is_deprecated());
        assert_eq!(
            ActionKind::RescheduleBookingSuccessful.successor(),
            Some(ActionKind::RescheduleBookingSuccessfulV2)
        );
        assert!(!ActionKind::BookingSuccessfulV2.is_deprecated());
    }

    #[test]
    fn booking_v2_omits_absent_fields_but_keeps_null_event_type_id() {
        let payload = BookingSuccessfulV2 {
            summary: BookingSummary {
                uid: Some("abc".into()),
                payment_required: false,
                is_recurring: false,
                ..BookingSummary::default()
            },
            video_call_url: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "uid": "abc",
                "eventTypeId": null,
                "paymentRequired": false,
                "isRecurring": false
            })
        );
    }

    #[test]
    fn reschedule_v2_is_flat() {
        let raw = json!({
            "uid": "u1",
            "eventTypeId": 7,
            "paymentRequired": true,
            "isRecurring": true,
            "allBookings": [{"startTime": "a", "endTime": "b"}]
        });
        let payload: RescheduleBookingSuccessfulV2 = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(payload.0.event_type_id, Some(7));
        assert_eq!(payload.0.all_bookings.as_ref().map(Vec::len), Some(1));
        assert_eq!(serde_json::to_value(&payload).unwrap(), raw);
    }

    #[test]
    fn routed_action_types_use_wire_spelling() {
        let routed = Routed {
            action_type: RoutingAction::ExternalRedirectUrl,
            action_value: "https://x".into(),
        };
        assert_eq!(
            serde_json::to_value(&routed).unwrap(),
            json!({"actionType": "externalRedirectUrl", "actionValue": "https://x"})
        );
    }

    #[test]
    fn empty_payloads_are_empty_objects() {
        assert_eq!(serde_json::to_value(LinkReady {}).unwrap(), json!({}));
        let parsed: CloseIframe = serde_json::from_value(json!({"extra": 1})).unwrap();
        assert_eq!(parsed, CloseIframe {});
    }

    #[test]
    fn validate_checks_declared_shape() {
        assert!(ActionKind::ScrollByDistance
            .validate(&json!({"distance": 120}))
            .is_ok());
        assert!(ActionKind::ScrollByDistance
            .validate(&json!({"distance": "far"}))
            .is_err());
        assert!(ActionKind::Routed
            .validate(&json!({"actionType": "teleport", "actionValue": "x"}))
            .is_err());
        assert!(ActionKind::LinkReady.validate(&json!({})).is_ok());
    }

    #[test]
    fn legacy_and_v2_coexist() {
        assert_ne!(BookingSuccessful::KIND, BookingSuccessfulV2::KIND);
        assert_eq!(BookingSuccessful::KIND.successor(), Some(BookingSuccessfulV2::KIND));
    }
}
