use std::sync::Arc;
use tokio::sync::broadcast;

use iqx_doorbus::bus::{LocalBus, ReplyHandle};
use iqx_doorbus::config::BusSettings;
use iqx_doorbus::controllers::{DoorCapabilities, ProvidedDoor, PublishOutcome};
use iqx_doorbus::errors::DoorBusError;
use iqx_doorbus::models::{BusMessage, DoorEvent, DoorMethod, ObjectPath, RegistrationState};

fn create_bus() -> Arc<LocalBus> {
    Arc::new(LocalBus::new(&BusSettings::default()))
}

fn door_path(index: usize) -> ObjectPath {
    ObjectPath::indexed("/Door/", index).unwrap()
}

async fn create_published_door(bus: &Arc<LocalBus>, location: &str, index: usize) -> Arc<ProvidedDoor> {
    let door = ProvidedDoor::new(bus.clone(), location, false, door_path(index)).unwrap();
    assert_eq!(door.publish().await.unwrap(), PublishOutcome::Published);
    door
}

fn drain(receiver: &mut broadcast::Receiver<BusMessage>) -> Vec<BusMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = receiver.try_recv() {
        messages.push(message);
    }
    messages
}

fn updates(messages: &[BusMessage]) -> Vec<bool> {
    messages
        .iter()
        .filter_map(|message| match message {
            BusMessage::Update { is_open, .. } => Some(*is_open),
            _ => None,
        })
        .collect()
}

#[test]
fn test_object_path_validation() {
    assert_eq!(ObjectPath::parse("/Door/1").unwrap().as_str(), "/Door/1");
    assert_eq!(ObjectPath::indexed("/Door/", 7).unwrap().to_string(), "/Door/7");
    assert!(ObjectPath::parse("/Garage_Door").is_ok());

    assert!(matches!(ObjectPath::parse("Door/1"), Err(DoorBusError::InvalidPath(_))));
    assert!(matches!(ObjectPath::parse("/"), Err(DoorBusError::InvalidPath(_))));
    assert!(matches!(ObjectPath::parse("/Door//1"), Err(DoorBusError::InvalidPath(_))));
    assert!(matches!(ObjectPath::parse("/Door/1/"), Err(DoorBusError::InvalidPath(_))));
    assert!(matches!(ObjectPath::parse("/Front Door"), Err(DoorBusError::InvalidPath(_))));
}

#[test]
fn test_blank_location_is_rejected() {
    let bus = create_bus();
    let result = ProvidedDoor::new(bus.clone(), "   ", false, door_path(1));
    assert!(matches!(result, Err(DoorBusError::InvalidLocation(_))));
}

#[tokio::test]
async fn test_new_door_starts_unpublished_and_closed() {
    let bus = create_bus();
    let door = ProvidedDoor::new(bus.clone(), " Garage ", false, door_path(1)).unwrap();

    assert_eq!(door.location(), "Garage");
    assert_eq!(door.registration_state().await, RegistrationState::Unpublished);
    assert!(!door.is_open().await);
    assert!(!bus.is_registered(door.path()));
}

#[tokio::test]
async fn test_open_twice_replies_true_then_false() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;
    let mut traffic = bus.subscribe();

    assert!(bus.request_open(door.path()).await.unwrap());
    assert!(!bus.request_open(door.path()).await.unwrap());
    assert!(door.is_open().await);

    let messages = drain(&mut traffic);
    assert_eq!(
        messages,
        vec![
            BusMessage::Update { path: door_path(1), is_open: true },
            BusMessage::Reply { path: door_path(1), method: DoorMethod::Open, value: true },
            BusMessage::Reply { path: door_path(1), method: DoorMethod::Open, value: false },
        ]
    );
}

#[tokio::test]
async fn test_close_on_closed_door_is_a_noop() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;
    let mut traffic = bus.subscribe();

    assert!(!bus.request_close(door.path()).await.unwrap());
    assert!(!door.is_open().await);

    // No update for a request that changed nothing
    let messages = drain(&mut traffic);
    assert_eq!(
        messages,
        vec![BusMessage::Reply { path: door_path(1), method: DoorMethod::Close, value: false }]
    );
}

#[tokio::test]
async fn test_open_then_close_notifies_before_each_reply() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;
    let mut traffic = bus.subscribe();

    assert!(bus.request_open(door.path()).await.unwrap());
    assert!(bus.request_close(door.path()).await.unwrap());
    assert!(!door.is_open().await);

    let messages = drain(&mut traffic);
    assert_eq!(
        messages,
        vec![
            BusMessage::Update { path: door_path(1), is_open: true },
            BusMessage::Reply { path: door_path(1), method: DoorMethod::Open, value: true },
            BusMessage::Update { path: door_path(1), is_open: false },
            BusMessage::Reply { path: door_path(1), method: DoorMethod::Close, value: true },
        ]
    );
}

#[tokio::test]
async fn test_local_open_returns_and_sends_the_reply() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;

    let (reply, receiver) = ReplyHandle::channel(door.path().clone(), DoorMethod::Open);
    assert!(door.open(reply).await.unwrap());
    assert!(receiver.await.unwrap());

    let (reply, receiver) = ReplyHandle::channel(door.path().clone(), DoorMethod::Open);
    assert!(!door.open(reply).await.unwrap());
    assert!(!receiver.await.unwrap());
}

#[tokio::test]
async fn test_open_reports_a_caller_that_went_away() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;

    let (reply, receiver) = ReplyHandle::channel(door.path().clone(), DoorMethod::Open);
    drop(receiver);

    let result = door.open(reply).await;
    assert!(matches!(result, Err(DoorBusError::ChannelSendError(_))));
    // The transition itself still happened
    assert!(door.is_open().await);
}

#[tokio::test]
async fn test_flip_open_toggles_and_notifies() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;
    let mut traffic = bus.subscribe();

    assert!(door.flip_open().await.unwrap());
    assert!(!door.flip_open().await.unwrap());
    assert!(!door.is_open().await);

    let messages = drain(&mut traffic);
    assert_eq!(updates(&messages), vec![true, false]);
    assert_eq!(messages.len(), 2, "flip sends updates only, never replies");
}

#[tokio::test]
async fn test_pass_through_emits_event_without_changing_state() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Lobby", 2).await;
    let mut traffic = bus.subscribe();

    door.announce_pass_through("Alice").await.unwrap();
    assert!(!door.is_open().await);

    let messages = drain(&mut traffic);
    assert_eq!(
        messages,
        vec![BusMessage::Event {
            path: door_path(2),
            event: DoorEvent::PersonPassedThrough { who: "Alice".to_string() },
        }]
    );
}

#[tokio::test]
async fn test_retract_unpublished_door_fails() {
    let bus = create_bus();
    let door = ProvidedDoor::new(bus.clone(), "Garage", false, door_path(1)).unwrap();

    let result = door.retract().await;
    assert!(matches!(result, Err(DoorBusError::NotRegistered(_))));
    assert_eq!(door.registration_state().await, RegistrationState::Unpublished);
}

#[tokio::test]
async fn test_publish_when_registered_reannounces() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;
    door.flip_open().await.unwrap();
    let mut traffic = bus.subscribe();

    assert_eq!(door.publish().await.unwrap(), PublishOutcome::Reannounced);
    assert_eq!(door.registration_state().await, RegistrationState::Registered);

    let messages = drain(&mut traffic);
    assert_eq!(messages, vec![BusMessage::Update { path: door_path(1), is_open: true }]);
}

#[tokio::test]
async fn test_retracted_door_is_unreachable_until_republished() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;

    door.retract().await.unwrap();
    assert_eq!(door.registration_state().await, RegistrationState::Unpublished);
    assert!(matches!(
        bus.request_open(door.path()).await,
        Err(DoorBusError::ObjectNotFound(_))
    ));

    assert_eq!(door.publish().await.unwrap(), PublishOutcome::Published);
    assert!(bus.request_open(door.path()).await.unwrap());
}

#[tokio::test]
async fn test_unpublished_door_changes_are_not_broadcast() {
    let bus = create_bus();
    let door = ProvidedDoor::new(bus.clone(), "Garage", false, door_path(1)).unwrap();
    let mut traffic = bus.subscribe();

    assert!(door.flip_open().await.unwrap());
    door.announce_pass_through("Bob").await.unwrap();

    assert!(door.is_open().await);
    assert!(drain(&mut traffic).is_empty());
}

#[tokio::test]
async fn test_publish_failure_keeps_door_unpublished() {
    let bus = create_bus();
    let door = ProvidedDoor::new(bus.clone(), "Garage", false, door_path(1)).unwrap();

    bus.set_connected(false);
    let result = door.publish().await;
    assert!(matches!(result, Err(DoorBusError::ConnectionError(_))));
    assert_eq!(door.registration_state().await, RegistrationState::Unpublished);

    bus.set_connected(true);
    assert_eq!(door.publish().await.unwrap(), PublishOutcome::Published);
}

#[tokio::test]
async fn test_reannounce_and_retract_failures_keep_registration() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;

    bus.set_connected(false);
    assert!(matches!(door.publish().await, Err(DoorBusError::ConnectionError(_))));
    assert!(matches!(door.retract().await, Err(DoorBusError::ConnectionError(_))));
    assert_eq!(door.registration_state().await, RegistrationState::Registered);

    bus.set_connected(true);
    door.retract().await.unwrap();
    assert_eq!(door.registration_state().await, RegistrationState::Unpublished);
}

#[tokio::test]
async fn test_two_doors_cannot_share_a_path() {
    let bus = create_bus();
    let _garage = create_published_door(&bus, "Garage", 1).await;
    let impostor = ProvidedDoor::new(bus.clone(), "Impostor", false, door_path(1)).unwrap();

    assert!(matches!(
        impostor.publish().await,
        Err(DoorBusError::RegistrationRefused { .. })
    ));
    assert_eq!(impostor.registration_state().await, RegistrationState::Unpublished);
}

#[tokio::test]
async fn test_bus_does_not_keep_doors_alive() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;
    let path = door.path().clone();
    assert!(bus.is_registered(&path));

    drop(door);
    assert!(!bus.is_registered(&path));
    assert!(matches!(bus.request_open(&path).await, Err(DoorBusError::ObjectNotFound(_))));
}

#[tokio::test]
async fn test_open_on_unpublished_door_is_refused() {
    let bus = create_bus();
    let door = ProvidedDoor::new(bus.clone(), "Garage", false, door_path(1)).unwrap();

    let (reply, receiver) = ReplyHandle::channel(door.path().clone(), DoorMethod::Open);
    assert!(matches!(door.open(reply).await, Err(DoorBusError::NotRegistered(_))));
    assert!(!receiver.await.unwrap());
    assert!(!door.is_open().await);
}

#[tokio::test]
async fn test_open_racing_retract_leaves_the_door_untouched() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;
    let mut traffic = bus.subscribe();

    // The open is delivered on its own task, so the retract takes the lock first
    let (replied, retracted) = tokio::join!(bus.request_open(door.path()), door.retract());

    assert!(retracted.is_ok());
    assert!(!replied.unwrap());
    assert_eq!(door.registration_state().await, RegistrationState::Unpublished);
    assert!(!door.is_open().await);
    assert_eq!(
        drain(&mut traffic),
        vec![
            BusMessage::Deregistered { path: door_path(1) },
            BusMessage::Reply { path: door_path(1), method: DoorMethod::Open, value: false },
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_remote_open_and_local_flip_are_serialized() {
    for _ in 0..50 {
        let bus = create_bus();
        let door = create_published_door(&bus, "Garage", 1).await;
        let mut traffic = bus.subscribe();

        let (replied, flipped) = futures::future::join(
            bus.request_open(door.path()),
            door.flip_open(),
        )
        .await;
        let replied = replied.unwrap();
        let flipped = flipped.unwrap();

        let messages = drain(&mut traffic);
        if replied {
            // Open ran first on the closed door, then the flip closed it again
            assert!(!flipped);
            assert!(!door.is_open().await);
            assert_eq!(updates(&messages), vec![true, false]);
        } else {
            // The flip opened the door first, leaving the open request nothing to do
            assert!(flipped);
            assert!(door.is_open().await);
            assert_eq!(updates(&messages), vec![true]);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_produce_one_update_per_transition() {
    let bus = create_bus();
    let door = create_published_door(&bus, "Garage", 1).await;
    let mut traffic = bus.subscribe();

    let requests = (0..20).map(|i| {
        let bus = Arc::clone(&bus);
        let path = door.path().clone();
        async move {
            if i % 2 == 0 {
                bus.request_open(&path).await
            } else {
                bus.request_close(&path).await
            }
        }
    });
    let replies: Vec<bool> = futures::future::join_all(requests)
        .await
        .into_iter()
        .map(|reply| reply.unwrap())
        .collect();

    let transitions = replies.iter().filter(|complied| **complied).count();
    let messages = drain(&mut traffic);
    let updates = updates(&messages);
    assert_eq!(updates.len(), transitions);

    // Successful transitions alternate, starting from the closed door
    for (index, is_open) in updates.iter().enumerate() {
        assert_eq!(*is_open, index % 2 == 0);
    }
    assert_eq!(door.is_open().await, updates.last().copied().unwrap_or(false));
}
