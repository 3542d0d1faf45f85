mod components;
mod planner;
mod sharing;
