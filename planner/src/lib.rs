// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Scheduling engine of the office planning page: date grids, the job
//! store, drag-and-drop booking and the sync cycle with the backend.

pub mod colors;
pub mod config;
pub mod database;
pub mod date_grid;
pub mod drag_drop;
pub mod error;
pub mod handlers;
pub mod job_store;
pub mod planner;
pub mod remote;
pub mod renderer;
pub mod routes;
pub mod view_state;
