mod helpers;
mod mocks;
mod projects;
mod settlement;
