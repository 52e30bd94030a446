use rs_code_breaker::*;

fn assert_remaining_covers_open(state: &SolverState) {
    let remaining: usize = state.remaining_counts().iter().sum();
    assert_eq!(remaining, state.num_open());
}

#[test]
fn remaining_matches_open_positions_through_mutations() {
    // Length 8 with counts B:4, A:2, C:2.
    let mut state = SolverState::new(8, [4, 2, 2, 0, 0, 0]);
    assert_remaining_covers_open(&state);

    state.confirm(0, 0);
    assert_remaining_covers_open(&state);

    state.confirm(5, 2);
    assert_remaining_covers_open(&state);

    let mut group = PositionSet::empty();
    group.insert(1);
    group.insert(2);
    group.insert(3);
    state.assign_all(group, 0);
    assert_remaining_covers_open(&state);

    // Eliminations restrict candidate sets without touching the counts.
    state.eliminate(1, 6);
    assert_remaining_covers_open(&state);

    state.confirm(4, 1);
    state.confirm(6, 2);
    state.confirm(7, 1);
    assert_remaining_covers_open(&state);
    assert!(state.all_confirmed());
    assert_eq!(state.num_open(), 0);
}

#[test]
fn confirming_a_position_removes_it_from_other_letters() {
    let mut state = SolverState::new(4, [2, 1, 1, 0, 0, 0]);

    state.confirm(2, 1);

    for letter in 0..ALPHABET_SIZE {
        assert_eq!(state.mask(letter).contains(2), letter == 1);
    }
}

#[test]
fn confirmed_letters_are_final() {
    let mut state = SolverState::new(3, [1, 1, 1, 0, 0, 0]);
    state.set_tentative(1, 2);

    state.confirm(1, 2);

    assert!(state.is_confirmed(1));
    assert_eq!(state.tentative(1), 2);
    assert_eq!(state.candidate_string(), "BCB");

    // Later work on other positions leaves the confirmed letter alone.
    state.confirm(0, 0);
    state.confirm(2, 1);
    assert_eq!(state.tentative(1), 2);
    assert_eq!(state.candidate_string(), "BCA");
}

#[test]
fn open_positions_shrink_as_confirmations_land() {
    let mut state = SolverState::new(5, [5, 0, 0, 0, 0, 0]);

    assert_eq!(state.open_positions().len(), 5);

    state.confirm(0, 0);
    state.confirm(3, 0);

    let open = state.open_positions();
    assert_eq!(open.positions().collect::<Vec<usize>>(), vec![1, 2, 4]);
}
