// SmartMark presentation layer
// Rendering is a pure function of application state; front-ends draw the resulting view model.

pub mod view;
