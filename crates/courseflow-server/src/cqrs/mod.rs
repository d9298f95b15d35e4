pub use mediator::DefaultAsyncMediator;

use crate::store::SharedStore;

pub mod middleware;

pub type AppMediator = DefaultAsyncMediator;

pub fn build_mediator(store: SharedStore) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Enrollments
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move { crate::features::enrollments::commands::enroll::handle(store, cmd).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move {
                    crate::features::enrollments::queries::get_enrollment::handle(store, query).await
                }
            }
        })
        // Progress
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move {
                    crate::features::progress::commands::mark_lesson_complete::handle(store, cmd).await
                }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move {
                    crate::features::progress::queries::get_lesson_progress::handle(store, query).await
                }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move {
                    crate::features::progress::queries::get_course_progress::handle(store, query).await
                }
            }
        })
        // Chapters
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { crate::features::chapters::queries::next_lesson::handle(store, query).await }
            }
        })
        // Courses
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { crate::features::courses::queries::get_outline::handle(store, query).await }
            }
        })
        .build()
}
