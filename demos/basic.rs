//! Basic example of driving the puzzle engine without a front end

use jigsaw_core::leaderboard::{MemoryStore, MockLeaderboard};
use jigsaw_core::{
    compute_hint, Event, ImageCatalog, LeaderboardManager, Permutation, PointerEvent, PointerId,
    RecordingPresenter, Session, SessionConfig, Shuffler,
};

fn main() {
    let catalog = ImageCatalog::default();
    let image = catalog.url(0).unwrap_or_default();
    println!("Playing {} ({} images available)\n", image, catalog.len());

    // Start a 4x4 game the way a player would
    let mut presenter = RecordingPresenter::default();
    let mut session =
        Session::new(SessionConfig::default(), 0).with_shuffler(Shuffler::with_seed(2024));
    session.handle(Event::SelectImage(image.clone()), &mut presenter);
    session.handle(Event::ChooseDifficulty(4), &mut presenter);

    let game = session.game().expect("game started");
    println!("Shuffled board: {:?}", game.permutation.pieces());
    println!("Misplaced pieces: {}\n", game.permutation.misplaced_count());

    // Follow hints until solved, one second per move
    let mut now = 0;
    while let Some(hint) = session.game().and_then(|g| compute_hint(&g.permutation)) {
        now += 1000;
        session.advance(now, &mut presenter);
        let (fx, fy) = presenter.geometry.cell_center(hint.source);
        let (tx, ty) = presenter.geometry.cell_center(hint.destination);
        let pointer = PointerId(1);
        session.handle(Event::Pointer(PointerEvent::down(pointer, fx, fy)), &mut presenter);
        session.handle(Event::Pointer(PointerEvent::moved(pointer, tx, ty)), &mut presenter);
        session.handle(Event::Pointer(PointerEvent::up(pointer, tx, ty)), &mut presenter);
        if session.victory().is_some() {
            break;
        }
    }

    if let Some(victory) = session.victory() {
        println!(
            "Solved in {} moves, {}: {} points ({})",
            victory.moves,
            victory.time_string(),
            victory.score,
            victory.status
        );
    }

    // Submit to an in-memory leaderboard
    let manager = LeaderboardManager::new(Box::new(MockLeaderboard::new(MemoryStore::new())));
    match session.submit_score("demo", now, &manager, &mut presenter) {
        Ok(()) => {
            if let Ok(view) = manager.list() {
                for entry in view.entries() {
                    println!(
                        "#{} {} {} {} {}",
                        entry.rank,
                        entry.record.nickname,
                        entry.record.score,
                        entry.record.difficulty,
                        entry.record.time
                    );
                }
            }
        }
        Err(e) => println!("Submission failed: {}", e),
    }

    // A board one swap from solved
    let perm = Permutation::from_pieces(2, vec![1, 0, 2, 3]).expect("valid permutation");
    println!("\nHint for {:?}: {:?}", perm.pieces(), compute_hint(&perm));
}
