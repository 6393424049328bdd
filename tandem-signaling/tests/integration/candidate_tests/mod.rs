mod test_candidate_queue;
