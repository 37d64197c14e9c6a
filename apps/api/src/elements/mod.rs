pub mod handlers;
pub mod store;

use axum::{routing::get, Router};
use resume_domain::{
    Award, Certification, Education, Element, Experience, Heading, Project, Skill, Volunteer,
};

use crate::state::AppState;

/// `/api/<kind>/` and `/api/<kind>/:id` for one element kind. The collection
/// route answers with and without the trailing slash.
fn mount<T: Element>(router: Router<AppState>) -> Router<AppState> {
    let base = format!("/api/{}", T::KIND.as_str());
    let collection = || get(handlers::list::<T>).post(handlers::create::<T>);
    router
        .route(&base, collection())
        .route(&format!("{base}/"), collection())
        .route(
            &format!("{base}/:id"),
            get(handlers::get::<T>)
                .put(handlers::update::<T>)
                .delete(handlers::delete::<T>),
        )
}

pub fn router() -> Router<AppState> {
    let router = Router::new();
    let router = mount::<Heading>(router);
    let router = mount::<Education>(router);
    let router = mount::<Experience>(router);
    let router = mount::<Project>(router);
    let router = mount::<Skill>(router);
    let router = mount::<Certification>(router);
    let router = mount::<Award>(router);
    mount::<Volunteer>(router)
}
