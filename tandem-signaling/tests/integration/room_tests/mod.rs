mod test_close_silences_session;
mod test_create_room_posts_offer;
mod test_join_rejections;
mod test_local_candidates_accumulate;
