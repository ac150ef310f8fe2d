mod common;

use chess_core::TeamColor;
use common::{is_snapshot, mv, seated_game, Client};
use server::hub::{Command, CommandError, Connection, Outbound, Role, ServerMessage};
use server::store::GameStore;

#[tokio::test]
async fn join_notifies_others_and_snapshots_joiner() {
    let (hub, _) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let mut alice = Client::new();
    let mut bob = Client::new();
    let mut carol = Client::new();

    hub.join(game_id, "alice", Role::White, alice.handle()).await.unwrap();
    let first = alice.drain();
    assert_eq!(first.len(), 1);
    assert!(is_snapshot(&first[0]));

    hub.join(game_id, "bob", Role::Black, bob.handle()).await.unwrap();
    assert_eq!(
        alice.drain(),
        vec![ServerMessage::notification("bob joined the game as black")]
    );
    let joined = bob.drain();
    assert_eq!(joined.len(), 1);
    assert!(is_snapshot(&joined[0]));

    hub.join(game_id, "carol", Role::Observer, carol.handle()).await.unwrap();
    let expected = ServerMessage::notification("carol joined the game as an observer");
    assert_eq!(alice.drain(), vec![expected.clone()]);
    assert_eq!(bob.drain(), vec![expected]);
    assert!(is_snapshot(&carol.drain()[0]));

    assert_eq!(hub.connected(game_id).await, vec!["alice", "bob", "carol"]);
}

#[tokio::test]
async fn join_requires_the_recorded_seat() {
    let (hub, store) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let mut carol = Client::new();

    let err = hub
        .join(game_id, "carol", Role::White, carol.handle())
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::WrongSeat(TeamColor::White)));
    assert!(carol.drain().is_empty());

    // A vacant seat must be claimed before joining it.
    let open = store.create("open").unwrap();
    let err = hub.join(open, "carol", Role::Black, carol.handle()).await.unwrap_err();
    assert!(matches!(err, CommandError::WrongSeat(TeamColor::Black)));

    assert!(hub.connected(game_id).await.is_empty());
}

#[tokio::test]
async fn join_unknown_game_is_rejected() {
    let (hub, _) = common::hub();
    let client = Client::new();
    let err = hub.join(42, "alice", Role::Observer, client.handle()).await.unwrap_err();
    assert!(matches!(err, CommandError::GameNotFound(42)));
}

#[tokio::test]
async fn accepted_move_is_saved_and_broadcast() {
    let (hub, store) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let mut alice = Client::new();
    let mut bob = Client::new();
    let mut carol = Client::new();
    hub.join(game_id, "alice", Role::White, alice.handle()).await.unwrap();
    hub.join(game_id, "bob", Role::Black, bob.handle()).await.unwrap();
    hub.join(game_id, "carol", Role::Observer, carol.handle()).await.unwrap();
    alice.drain();
    bob.drain();
    carol.drain();

    hub.make_move(game_id, "alice", mv("e2e4")).await.unwrap();

    let record = store.load(game_id).unwrap().unwrap();
    assert_eq!(record.game.turn(), TeamColor::Black);
    assert!(record.game.board().piece("e4".parse().unwrap()).is_some());

    let own = alice.drain();
    assert_eq!(own.len(), 1, "mover only receives the new state");
    assert_eq!(own[0], ServerMessage::snapshot(&record));

    for other in [&mut bob, &mut carol] {
        let received = other.drain();
        assert_eq!(
            received,
            vec![
                ServerMessage::notification("alice moved e2e4"),
                ServerMessage::snapshot(&record),
            ]
        );
    }
}

#[tokio::test]
async fn observer_cannot_move() {
    let (hub, store) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let mut alice = Client::new();
    let mut carol = Client::new();
    hub.join(game_id, "alice", Role::White, alice.handle()).await.unwrap();
    hub.join(game_id, "carol", Role::Observer, carol.handle()).await.unwrap();
    alice.drain();
    carol.drain();

    let command = Command::Move { game_id, mv: mv("e2e4") };
    let err = hub.dispatch("carol", command, carol.handle()).await.unwrap_err();
    assert!(matches!(err, CommandError::NotASeat));

    assert_eq!(
        carol.drain(),
        vec![ServerMessage::failure("You are observing this game")]
    );
    assert!(alice.drain().is_empty());
    assert_eq!(store.load(game_id).unwrap().unwrap().game.turn(), TeamColor::White);
}

#[tokio::test]
async fn moving_out_of_turn_is_rejected() {
    let (hub, _) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;

    let err = hub.make_move(game_id, "bob", mv("e7e5")).await.unwrap_err();
    assert!(matches!(err, CommandError::OutOfTurn));
}

#[tokio::test]
async fn illegal_move_reaches_only_the_mover() {
    let (hub, store) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let mut alice = Client::new();
    let mut bob = Client::new();
    hub.join(game_id, "alice", Role::White, alice.handle()).await.unwrap();
    hub.join(game_id, "bob", Role::Black, bob.handle()).await.unwrap();
    alice.drain();
    bob.drain();

    let before = store.load(game_id).unwrap().unwrap();
    let command = Command::Move { game_id, mv: mv("e2e5") };
    let err = hub.dispatch("alice", command, alice.handle()).await.unwrap_err();
    assert!(matches!(err, CommandError::IllegalMove { .. }));

    let failures = alice.drain();
    assert_eq!(failures.len(), 1);
    assert!(matches!(&failures[0], ServerMessage::Failure { message } if message.contains("e2e5")));
    assert!(bob.drain().is_empty());
    assert_eq!(store.load(game_id).unwrap().unwrap(), before);
}

#[tokio::test]
async fn checkmate_finishes_the_game() {
    let (hub, store) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let mut alice = Client::new();
    hub.join(game_id, "alice", Role::White, alice.handle()).await.unwrap();

    hub.make_move(game_id, "alice", mv("f2f3")).await.unwrap();
    hub.make_move(game_id, "bob", mv("e7e5")).await.unwrap();
    hub.make_move(game_id, "alice", mv("g2g4")).await.unwrap();
    alice.drain();
    hub.make_move(game_id, "bob", mv("d8h4")).await.unwrap();

    let received = alice.drain();
    assert_eq!(received[0], ServerMessage::notification("Checkmate! bob wins!"));
    assert!(is_snapshot(&received[1]));
    assert!(store.load(game_id).unwrap().unwrap().finished);

    let err = hub.make_move(game_id, "alice", mv("e2e4")).await.unwrap_err();
    assert!(matches!(err, CommandError::GameOver));
}

#[tokio::test]
async fn check_is_announced_to_the_opponent() {
    let (hub, _) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let mut bob = Client::new();
    hub.join(game_id, "bob", Role::Black, bob.handle()).await.unwrap();

    hub.make_move(game_id, "alice", mv("e2e4")).await.unwrap();
    hub.make_move(game_id, "bob", mv("f7f6")).await.unwrap();
    bob.drain();
    hub.make_move(game_id, "alice", mv("d1h5")).await.unwrap();

    let notes = bob.notifications();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].starts_with("Check!"), "got {notes:?}");
}

#[tokio::test]
async fn resign_ends_the_game_for_everyone() {
    let (hub, store) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let mut alice = Client::new();
    let mut bob = Client::new();
    let mut carol = Client::new();
    hub.join(game_id, "alice", Role::White, alice.handle()).await.unwrap();
    hub.join(game_id, "bob", Role::Black, bob.handle()).await.unwrap();
    hub.join(game_id, "carol", Role::Observer, carol.handle()).await.unwrap();
    alice.drain();
    bob.drain();
    carol.drain();

    let err = hub.resign(game_id, "carol").await.unwrap_err();
    assert!(matches!(err, CommandError::NotASeat));

    hub.resign(game_id, "alice").await.unwrap();
    let expected = vec![ServerMessage::notification("alice resigned. bob wins!")];
    assert_eq!(alice.drain(), expected);
    assert_eq!(bob.drain(), expected);
    assert_eq!(carol.drain(), expected);
    assert!(store.load(game_id).unwrap().unwrap().finished);

    let err = hub.make_move(game_id, "bob", mv("e7e5")).await.unwrap_err();
    assert!(matches!(err, CommandError::GameOver));
    let err = hub.make_move(game_id, "alice", mv("e2e4")).await.unwrap_err();
    assert!(matches!(err, CommandError::GameOver));
    let err = hub.resign(game_id, "bob").await.unwrap_err();
    assert!(matches!(err, CommandError::GameOver));
}

#[tokio::test]
async fn leave_vacates_the_seat_and_closes_the_connection() {
    let (hub, store) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let mut alice = Client::new();
    let mut bob = Client::new();
    hub.join(game_id, "alice", Role::White, alice.handle()).await.unwrap();
    hub.join(game_id, "bob", Role::Black, bob.handle()).await.unwrap();
    alice.drain();
    bob.drain();

    hub.leave(game_id, "bob", bob.handle()).await.unwrap();

    assert_eq!(alice.drain(), vec![ServerMessage::notification("bob left the game")]);
    assert!(matches!(bob.frames().last(), Some(Outbound::Close)));
    assert_eq!(store.load(game_id).unwrap().unwrap().black, None);
    assert_eq!(hub.connected(game_id).await, vec!["alice"]);

    // The seat is free for someone else now.
    hub.claim_seat(game_id, "dave", TeamColor::Black).await.unwrap();
}

#[tokio::test]
async fn disconnect_keeps_the_seat() {
    let (hub, store) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let bob = Client::new();
    hub.join(game_id, "bob", Role::Black, bob.handle()).await.unwrap();

    hub.disconnect(game_id, "bob", bob.conn.id()).await;

    assert!(hub.connected(game_id).await.is_empty());
    assert_eq!(store.load(game_id).unwrap().unwrap().black.as_deref(), Some("bob"));

    let again = Client::new();
    hub.join(game_id, "bob", Role::Black, again.handle()).await.unwrap();
    assert_eq!(hub.connected(game_id).await, vec!["bob"]);
}

#[tokio::test]
async fn dead_connections_are_pruned_on_broadcast() {
    let (hub, _) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let alice = Client::new();
    let bob = Client::new();
    hub.join(game_id, "alice", Role::White, alice.handle()).await.unwrap();
    hub.join(game_id, "bob", Role::Black, bob.handle()).await.unwrap();

    drop(bob);
    hub.make_move(game_id, "alice", mv("e2e4")).await.unwrap();

    assert_eq!(hub.connected(game_id).await, vec!["alice"]);
}

#[tokio::test]
async fn claim_seat_conflicts() {
    let (hub, store) = common::hub();
    let game_id = store.create("seats").unwrap();

    hub.claim_seat(game_id, "alice", TeamColor::White).await.unwrap();
    // Reclaiming is a no-op.
    hub.claim_seat(game_id, "alice", TeamColor::White).await.unwrap();

    let err = hub.claim_seat(game_id, "bob", TeamColor::White).await.unwrap_err();
    assert!(matches!(err, CommandError::SeatTaken(TeamColor::White)));

    let err = hub.claim_seat(999, "bob", TeamColor::White).await.unwrap_err();
    assert!(matches!(err, CommandError::GameNotFound(999)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_moves_on_one_game_are_serialized() {
    let (hub, store) = common::hub();
    let game_id = seated_game(&hub, "alice", "bob").await;
    let mut bob = Client::new();
    hub.join(game_id, "bob", Role::Black, bob.handle()).await.unwrap();
    bob.drain();

    let first = {
        let hub = hub.clone();
        tokio::spawn(async move { hub.make_move(game_id, "alice", mv("e2e4")).await })
    };
    let second = {
        let hub = hub.clone();
        tokio::spawn(async move { hub.make_move(game_id, "alice", mv("d2d4")).await })
    };
    let results = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let rejected = results.into_iter().find_map(Result::err).unwrap();
    assert!(matches!(rejected, CommandError::OutOfTurn));

    assert_eq!(bob.notifications().len(), 1);
    assert_eq!(store.load(game_id).unwrap().unwrap().game.turn(), TeamColor::Black);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn games_do_not_share_broadcasts() {
    let (hub, _) = common::hub();
    let first = seated_game(&hub, "alice", "bob").await;
    let second = seated_game(&hub, "carol", "dave").await;
    let mut bob = Client::new();
    let mut dave = Client::new();
    hub.join(first, "bob", Role::Black, bob.handle()).await.unwrap();
    hub.join(second, "dave", Role::Black, dave.handle()).await.unwrap();
    bob.drain();
    dave.drain();

    let a = {
        let hub = hub.clone();
        tokio::spawn(async move { hub.make_move(first, "alice", mv("e2e4")).await })
    };
    let b = {
        let hub = hub.clone();
        tokio::spawn(async move { hub.make_move(second, "carol", mv("d2d4")).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(bob.notifications(), vec!["alice moved e2e4"]);
    assert_eq!(dave.notifications(), vec!["carol moved d2d4"]);
}
