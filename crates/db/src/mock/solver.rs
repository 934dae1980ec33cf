use async_trait::async_trait;
use classcal_core::{
    errors::TimeResult,
    grid::WeekGrid,
    solver::{DraftRequest, DraftSolver},
};
use mockall::mock;

mock! {
    pub Solver {}

    #[async_trait]
    impl DraftSolver for Solver {
        async fn generate(&self, request: DraftRequest) -> TimeResult<WeekGrid>;
    }
}
